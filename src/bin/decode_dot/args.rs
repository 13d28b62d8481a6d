use clap::Parser;

/// Decode the position of a single 36x36 microdot camera snapshot.
#[derive(Debug, Parser)]
#[clap(version, about, long_about = None)]
pub struct Opt {
    /// Input file: a raw 1296-byte grayscale buffer, or a `.json` test case
    /// (a base64-encoded `image` field, matching the upstream capture
    /// tool's `testcases.json` format).
    #[clap(short, long, parse(from_os_str))]
    pub input: std::path::PathBuf,

    /// Enable trace-level logging of every pipeline stage.
    #[clap(short, long)]
    pub verbose: bool,
}
