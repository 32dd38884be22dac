use log::error;
use pnger::{ColourType, DecodeOptions, EncodeOptions};
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

/// Embeds a file within a PNG image or extracts it.
///
/// Hiding a file:      pnger -i secrets.txt -o secrets.png
///
/// Extracting a file:  pnger -i secrets.png -o secrets_recovered.txt --unpng
#[derive(StructOpt)]
#[structopt(name = "pnger")]
struct CommandArgs {
    /// The input file: the file to hide, or the .png to extract from
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,

    /// The output file: the new .png, or the extracted original file
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Extract from a PNG instead of creating one
    #[structopt(short, long)]
    unpng: bool,

    /// The PNG was made by the old pnger, which appended the file after a
    /// fixed image
    #[structopt(long, requires = "unpng")]
    legacy: bool,

    /// Canvas width in pixels [default: as square as possible]
    #[structopt(long)]
    width: Option<u32>,

    /// Pixel format: grey, grey-alpha, rgb or rgba
    #[structopt(long, default_value = "rgb", parse(try_from_str = parse_colour))]
    colour: ColourType,

    /// zlib compression level, 0 to 9
    #[structopt(long, default_value = "1")]
    level: u32,

    /// Largest IDAT chunk to write, in bytes
    #[structopt(long, default_value = "65536")]
    idat_size: usize,

    /// Largest image, in bytes of filtered scanlines, to write or read
    #[structopt(long, default_value = "1073741824")]
    max_canvas_bytes: u64,
}

fn parse_colour(s: &str) -> Result<ColourType, String> {
    match s {
        "grey" | "gray" => Ok(ColourType::GreyScale),
        "grey-alpha" | "gray-alpha" => Ok(ColourType::GreyScaleAlpha),
        "rgb" => Ok(ColourType::TrueColour),
        "rgba" => Ok(ColourType::TrueColourAlpha),
        other => Err(format!("unknown pixel format '{}'", other)),
    }
}

fn run(args: &CommandArgs) -> pnger::Result<()> {
    if args.unpng {
        let options = DecodeOptions::default().with_max_canvas_bytes(args.max_canvas_bytes);
        if args.legacy {
            pnger::legacy::decode_file(&args.input, &args.output, &options)?;
        } else {
            pnger::decode_file(&args.input, &args.output, &options)?;
        }
    } else {
        let mut options = EncodeOptions::default()
            .with_colour(args.colour)
            .with_level(args.level)
            .with_max_idat_len(args.idat_size)
            .with_max_canvas_bytes(args.max_canvas_bytes);
        if let Some(width) = args.width {
            options = options.with_width(width);
        }
        pnger::encode_file(&args.input, &args.output, &options)?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::from_args();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_flags_parse() {
        let args = CommandArgs::from_iter(vec!["pnger", "-i", "a.bin", "-o", "a.png"]);
        assert!(!args.unpng);
        assert_eq!(args.colour, ColourType::TrueColour);
        assert_eq!(args.max_canvas_bytes, pnger::options::DEFAULT_MAX_CANVAS_BYTES);

        let args = CommandArgs::from_iter(vec!["pnger", "-i", "a.png", "-o", "a.bin", "--unpng"]);
        assert!(args.unpng);
        assert_eq!(args.input, PathBuf::from("a.png"));
    }

    #[test]
    fn legacy_needs_unpng() {
        let without = vec!["pnger", "-i", "a", "-o", "b", "--legacy"];
        assert!(CommandArgs::from_iter_safe(without).is_err());

        let with = vec!["pnger", "-i", "a", "-o", "b", "-u", "--legacy"];
        assert!(CommandArgs::from_iter_safe(with).is_ok());
    }

    #[test]
    fn colour_names() {
        assert_eq!(parse_colour("rgba"), Ok(ColourType::TrueColourAlpha));
        assert_eq!(parse_colour("gray"), Ok(ColourType::GreyScale));
        assert!(parse_colour("cmyk").is_err());
    }
}
