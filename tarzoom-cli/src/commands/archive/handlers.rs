//! Command handlers for archive subcommands.
//!
//! Each handler merges its flags with the loaded configuration, calls the
//! archive service and reports the result.

use super::args::{
    DeinterleaveArgs, InspectArgs, InterleaveArgs, InterleaveFolderArgs, PackArgs, PackFolderArgs,
    VerifyArgs,
};
use super::output::{format_bytes, print_interleave_summary, print_pack_summary, print_report};
use super::traits::{CommandContext, CommandHandler};
use crate::error::CliError;
use tarzoom::batch::FolderPackOptions;
use tarzoom::pack::PackOptions;

// ============================================================================
// Pack Handler
// ============================================================================

/// Handler for the `pack` command.
pub struct PackHandler;

impl CommandHandler for PackHandler {
    type Args = PackArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        let settings = &ctx.config.pack;
        let options = PackOptions {
            missing_tiles: args
                .missing_tiles
                .map(Into::into)
                .unwrap_or(settings.missing_tiles),
            delete_sources: args.delete_sources || settings.delete_sources,
        };

        ctx.output
            .println(&format!("Packing {}", args.basename.display()));
        let summary = ctx.service.pack(&args.basename, options)?;
        print_pack_summary(ctx.output, &summary);
        Ok(())
    }
}

// ============================================================================
// Pack Folder Handler
// ============================================================================

/// Handler for the `pack-folder` command.
pub struct PackFolderHandler;

impl CommandHandler for PackFolderHandler {
    type Args = PackFolderArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        let settings = &ctx.config.pack;
        let options = FolderPackOptions {
            pack: PackOptions {
                missing_tiles: settings.missing_tiles,
                delete_sources: args.delete_sources || settings.delete_sources,
            },
            parallel: args.parallel || settings.parallel,
        };
        let output = args.output.unwrap_or_else(|| args.input.clone());

        ctx.output
            .println(&format!("Packing planes in {}", args.input.display()));
        let summaries = ctx.service.pack_folder(&args.input, &output, options)?;

        for summary in &summaries {
            ctx.output.newline();
            print_pack_summary(ctx.output, summary);
        }
        ctx.output.newline();
        ctx.output.println(&format!(
            "{} planes packed into {}",
            summaries.len(),
            output.display()
        ));
        Ok(())
    }
}

// ============================================================================
// Interleave Handler
// ============================================================================

/// Handler for the `interleave` command.
pub struct InterleaveHandler;

impl CommandHandler for InterleaveHandler {
    type Args = InterleaveArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        if args.planes.is_empty() {
            return Err(CliError::Usage("at least one plane is required".to_string()));
        }

        // Removing explicitly listed inputs is only done in folder mode.
        let mut options = ctx.config.interleave.interleave_options();
        options.validate_geometry = options.validate_geometry && !args.no_validate;
        options.delete_sources = false;

        ctx.output
            .println(&format!("Interleaving {} planes", args.planes.len()));
        let summary = ctx.service.interleave(&args.planes, &args.output, options)?;
        print_interleave_summary(ctx.output, &summary);
        Ok(())
    }
}

// ============================================================================
// Interleave Folder Handler
// ============================================================================

/// Handler for the `interleave-folder` command.
pub struct InterleaveFolderHandler;

impl CommandHandler for InterleaveFolderHandler {
    type Args = InterleaveFolderArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        let mut options = ctx.config.interleave.interleave_options();
        options.delete_sources = options.delete_sources || args.delete_sources;
        let output = args.output.unwrap_or_else(|| args.input.clone());

        ctx.output
            .println(&format!("Interleaving planes in {}", args.input.display()));
        let summary = ctx
            .service
            .interleave_folder(&args.input, &output, options)?;
        print_interleave_summary(ctx.output, &summary);
        Ok(())
    }
}

// ============================================================================
// Inspect Handler
// ============================================================================

/// Handler for the `inspect` command.
pub struct InspectHandler;

impl CommandHandler for InspectHandler {
    type Args = InspectArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        let report = ctx.service.inspect(&args.archive)?;
        print_report(ctx.output, &report);
        Ok(())
    }
}

// ============================================================================
// Verify Handler
// ============================================================================

/// Handler for the `verify` command.
pub struct VerifyHandler;

impl CommandHandler for VerifyHandler {
    type Args = VerifyArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        let index = ctx.service.verify(&args.archive)?;
        ctx.output.println(&format!(
            "OK: {} ranges, {}",
            index.range_count(),
            format_bytes(index.blob_len())
        ));
        Ok(())
    }
}

// ============================================================================
// Deinterleave Handler
// ============================================================================

/// Handler for the `deinterleave` command.
pub struct DeinterleaveHandler;

impl CommandHandler for DeinterleaveHandler {
    type Args = DeinterleaveArgs;

    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<(), CliError> {
        if args.prefix.is_empty() || args.prefix.contains(['/', '\\']) {
            return Err(CliError::Usage(format!(
                "prefix '{}' must be a plain file name",
                args.prefix
            )));
        }

        let planes = ctx.service.deinterleave(
            &args.archive,
            &args.output,
            &args.prefix,
            ctx.config.interleave.max_open_planes,
        )?;
        ctx.output.println(&format!(
            "Wrote {} plane archives to {}",
            planes.len(),
            args.output.display()
        ));
        for paths in &planes {
            ctx.output.indented(&paths.index.display().to_string());
        }
        Ok(())
    }
}
