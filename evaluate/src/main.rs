//! Evaluates a trained model against a gold-labeled test set.
//!
//! Each test line is `raw name<TAB>first name<TAB>last name 1<TAB>last
//! name 2`. The tally distinguishes field mismatches from outright decode
//! failures, and failures never abort the run.

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use csv_core::ReadFieldResult;
use nominato::{Model, TaggedExample, Tagger, evaluate};

#[derive(Parser, Debug)]
#[clap(name = "evaluate", about = "Evaluate the model accuracy")]
struct Args {
    /// Test set (TSV: name, first name, last name 1, last name 2).
    #[clap(short = 't', long)]
    test_in: PathBuf,

    /// Trained model (in zstd).
    #[clap(short = 'i', long)]
    model_in: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the model...");
    let model = Model::read(zstd::Decoder::new(File::open(args.model_in)?)?)?;
    let tagger = Tagger::new(model)?;
    let mut worker = tagger.new_worker();

    eprintln!("Decoding the test set...");
    let rdr = BufReader::new(File::open(args.test_in)?);
    let mut examples = vec![];
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = parse_tsv_row(&line).into_iter();
        let example = TaggedExample {
            text: fields.next().unwrap_or_default(),
            first_name: fields.next().unwrap_or_default(),
            last_name_1: fields.next().unwrap_or_default(),
            last_name_2: fields.next().unwrap_or_default(),
        };
        if example.text.is_empty() {
            return Err(format!("malformed test line: {line:?}").into());
        }
        examples.push(example);
    }

    let summary = evaluate(&examples, &mut worker);

    println!("Total = {}", summary.total);
    println!("Correct = {}", summary.correct);
    println!("Field mismatches = {}", summary.field_mismatches);
    println!("Decode failures = {}", summary.decode_failures);
    println!("Accuracy = {}", summary.accuracy());

    Ok(())
}

fn parse_tsv_row(row: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut rdr = csv_core::ReaderBuilder::new().delimiter(b'\t').build();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::Field { .. } => false,
            _ => unreachable!(),
        };
        fields.push(std::str::from_utf8(&output[..nout]).unwrap().to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    fields
}
