mod args;
mod input;

use args::Opt;
use clap::Parser;
use dotgrid_decode::codec::{AnotoCodec, Matrix4x4};
use dotgrid_decode::{decode_with_config, DecoderConfig};

fn main() {
    if let Err(e) = try_main() {
        eprintln!("decode-dot: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::parse();

    if opt.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Trace)
            .init();
    } else {
        env_logger::init();
    }

    let frame = input::load_frame(&opt.input)?;
    let config = DecoderConfig::default();

    match decode_with_config(&frame, &config, &UnimplementedCodec) {
        Ok((position, section)) => {
            println!("position: {position:?}");
            println!("section: {section:?}");
        }
        Err(e) => {
            println!("decode failed: {e}");
        }
    }

    Ok(())
}

/// The real Anoto position/section codec (MNS/A1/A2 sequences, prime
/// factors, delta range) is an external collaborator out of scope for this
/// crate (§9 "Codec opacity"). This stand-in lets the demo exercise the
/// full pipeline up to the codec boundary and report exactly where a real
/// codec would be plugged in.
struct UnimplementedCodec;

impl AnotoCodec for UnimplementedCodec {
    fn decode_position(&self, _matrix: &Matrix4x4) -> Result<(u32, u32), String> {
        Err("no AnotoCodec implementation configured; this demo only exercises \
             binarization through symbol-grid emission"
            .to_string())
    }

    fn decode_section(&self, _matrix: &Matrix4x4, _pos: (u32, u32)) -> Result<(u32, u32), String> {
        Err("no AnotoCodec implementation configured".to_string())
    }
}
