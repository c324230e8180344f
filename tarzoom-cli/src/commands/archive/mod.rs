//! Archive commands: pack, interleave, inspect, verify and deinterleave.
//!
//! Uses the command handler pattern with trait-based dependency injection:
//!
//! - `traits`: Core interfaces (`Output`, `ArchiveService`, `CommandHandler`)
//! - `services`: Concrete implementations of the traits
//! - `args`: CLI argument types and parsing (clap-derived)
//! - `handlers`: Command handlers implementing business logic
//! - `output`: Shared output formatting utilities

mod args;
mod handlers;
mod output;
mod services;
mod traits;


pub use args::ArchiveCommands;

use handlers::{
    DeinterleaveHandler, InspectHandler, InterleaveFolderHandler, InterleaveHandler,
    PackFolderHandler, PackHandler, VerifyHandler,
};
use services::{ConsoleOutput, DefaultArchiveService};
use traits::CommandHandler;

use args::{
    DeinterleaveArgs, InspectArgs, InterleaveArgs, InterleaveFolderArgs, PackArgs, PackFolderArgs,
    VerifyArgs,
};
use traits::CommandContext;

use crate::error::CliError;
use tarzoom::config::ConfigFile;

/// Run an archive subcommand with the production output and service.
pub fn run(command: ArchiveCommands, config: &ConfigFile) -> Result<(), CliError> {
    let output = ConsoleOutput::new();
    let service = DefaultArchiveService::new();
    let ctx = CommandContext::new(&output, &service, config);

    match command {
        ArchiveCommands::Pack {
            basename,
            missing_tiles,
            delete_sources,
        } => PackHandler::execute(
            PackArgs {
                basename,
                missing_tiles,
                delete_sources,
            },
            &ctx,
        ),

        ArchiveCommands::PackFolder {
            input,
            output,
            parallel,
            delete_sources,
        } => PackFolderHandler::execute(
            PackFolderArgs {
                input,
                output,
                parallel,
                delete_sources,
            },
            &ctx,
        ),

        ArchiveCommands::Interleave {
            planes,
            output,
            no_validate,
        } => InterleaveHandler::execute(
            InterleaveArgs {
                planes,
                output,
                no_validate,
            },
            &ctx,
        ),

        ArchiveCommands::InterleaveFolder {
            input,
            output,
            delete_sources,
        } => InterleaveFolderHandler::execute(
            InterleaveFolderArgs {
                input,
                output,
                delete_sources,
            },
            &ctx,
        ),

        ArchiveCommands::Inspect { archive } => {
            InspectHandler::execute(InspectArgs { archive }, &ctx)
        }

        ArchiveCommands::Verify { archive } => VerifyHandler::execute(VerifyArgs { archive }, &ctx),

        ArchiveCommands::Deinterleave {
            archive,
            output,
            prefix,
        } => DeinterleaveHandler::execute(
            DeinterleaveArgs {
                archive,
                output,
                prefix,
            },
            &ctx,
        ),
    }
}

impl ArchiveCommands {
    /// Name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ArchiveCommands::Pack { .. } => "pack",
            ArchiveCommands::PackFolder { .. } => "pack-folder",
            ArchiveCommands::Interleave { .. } => "interleave",
            ArchiveCommands::InterleaveFolder { .. } => "interleave-folder",
            ArchiveCommands::Inspect { .. } => "inspect",
            ArchiveCommands::Verify { .. } => "verify",
            ArchiveCommands::Deinterleave { .. } => "deinterleave",
        }
    }
}
