use docopt::Docopt;
use donor_medians::files::open_writer;
use donor_medians::pipeline::run_files;
use donor_medians::record::Layout;
use std::io::{Error, ErrorKind, Result, Write};

const USAGE: &'static str = "
Usage: donor_medians [options] <input> <zip-output> <date-output>
       donor_medians -h

Running median, count and total of contributions per recipient, by zip
code (one line per record) and by date (sorted, written at the end).
Files ending in .gz are read and written gzipped; '-' is stdin/stdout.

Options:
    -h                      Show this help message.
    -v                      Produce verbose output.
    -L YAML                 Read the field layout from a YAML file.
    -S FILE                 Write a JSON summary of the run to FILE.
";

fn main() -> Result<()> {
    let args = Docopt::new(USAGE)
        .and_then(|dopt| dopt.parse())
        .unwrap_or_else(|e| e.exit());

    let verbose = args.get_bool("-v");

    let layout = if args.get_str("-L").len() == 0 {
        Layout::default()
    } else {
        Layout::from_yaml(args.get_str("-L"))?
    };

    let input = args.get_str("<input>");
    let zip_name = args.get_str("<zip-output>");
    let date_name = args.get_str("<date-output>");
    let summary = run_files(input, zip_name, date_name, layout, verbose)?;

    let json = serde_json::to_string(&summary)
        .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
    if verbose {
        println!("{}", json);
    }
    if args.get_str("-S").len() > 0 {
        let mut out = open_writer(args.get_str("-S"))?;
        writeln!(out.as_mut(), "{}", json)?;
    }
    Ok(())
}
