use clap::{arg,crate_version,Command};
use mlz_codec::mlz;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();

    let long_help =
"Examples:
---------
Compress:      `mlz-codec compress -m mlz -i my_expanded -o my_compressed`
Expand:        `mlz-codec expand -m mlz -i my_compressed -o my_expanded`
Masked:        `mlz-codec compress -m mlz -i my_expanded -o my_compressed -k my_mask`";

    let methods = ["mlz"];

    let mut main_cmd = Command::new("mlz-codec")
        .about("Compress and expand with the MLZ masked-symbol LZW codec")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-k --mask <PATH> "per-byte mask width file (0..=7), defaults to all zero").required(false))
        .about("compress a file"));

        main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        let compressed: Vec<u8> = match method.as_str() {
            "mlz" => {
                let mask = match cmd.get_one::<String>("mask") {
                    Some(path) => std::fs::read(path)?,
                    None => vec![0u8; dat.len()],
                };
                mlz::compress_slice_masked(&dat,&mask)?
            },
            _ => {
                eprintln!("{} not supported",method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out,compressed)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        let expanded: Vec<u8> = match method.as_str() {
            "mlz" => mlz::expand_slice(&dat)?,
            _ => {
                eprintln!("{} not supported",method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out,expanded)?;
    }

    Ok(())
}
