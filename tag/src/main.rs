//! Tags personal names read from standard input.
//!
//! Each input line is one unstructured name. The result is printed in the
//! selected output format; lines the model cannot decode are reported and
//! skipped.

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use nominato::{Model, Tagger};

#[derive(Clone, Debug)]
enum OutputMode {
    Tagged,
    Fields,
    Detail,
}

impl FromStr for OutputMode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "tagged" => Ok(Self::Tagged),
            "fields" => Ok(Self::Fields),
            "detail" => Ok(Self::Detail),
            _ => Err("Could not parse a mode"),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "tag", about = "Splits personal names into structural fields")]
struct Args {
    /// Trained model (in zstd).
    #[clap(short = 'i', long)]
    model: PathBuf,

    /// Output mode. Choices are tagged, fields, and detail.
    #[clap(short = 'O', long, default_value = "tagged")]
    output_mode: OutputMode,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the model...");
    let model = Model::read(zstd::Decoder::new(File::open(args.model)?)?)?;

    let tagger = Tagger::new(model)?;
    let mut worker = tagger.new_worker();

    eprintln!("Ready to tag");

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    let lines = std::io::stdin().lock().lines();
    for line in lines {
        let line = line?;
        worker.reset_name(&line);
        match worker.tag() {
            Ok(()) => match args.output_mode {
                OutputMode::Tagged => {
                    for (token, state) in worker.observation().tokens().iter().zip(worker.states())
                    {
                        writeln!(&mut out, "{}\t{}", token.surface(), state)?;
                    }
                    out.write_all(b"EOS\n")?;
                }
                OutputMode::Fields => {
                    let fields = worker.fields();
                    writeln!(
                        &mut out,
                        "{}\t{}\t{}",
                        fields.first_name, fields.last_name_1, fields.last_name_2
                    )?;
                }
                OutputMode::Detail => {
                    for (token, state) in worker.observation().tokens().iter().zip(worker.states())
                    {
                        writeln!(
                            &mut out,
                            "{}\t{}\tsymbol={}",
                            token.surface(),
                            state,
                            token.symbol().as_str(),
                        )?;
                    }
                    let path_log_prob = worker.path_log_prob();
                    let log_likelihood = worker.log_likelihood()?;
                    writeln!(
                        &mut out,
                        "EOS\tpath_log_prob={path_log_prob}\tlog_likelihood={log_likelihood}"
                    )?;
                }
            },
            Err(e) => {
                writeln!(&mut out, "ERR\t{e}")?;
            }
        }
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
