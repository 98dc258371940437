pub mod config;
pub mod session;
pub mod update;
pub mod upload;

use clap::Args;

use blobdrop_transfer::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, TransferOptions};

/// Block size and parallelism for uploads.
#[derive(Args, Debug, Clone, Copy)]
pub struct TuningArgs {
    /// Block size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Number of blocks uploaded in parallel
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

impl From<TuningArgs> for TransferOptions {
    fn from(args: TuningArgs) -> Self {
        TransferOptions {
            chunk_size: args.chunk_size,
            concurrency: args.concurrency,
        }
    }
}
