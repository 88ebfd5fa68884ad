//! Model trainer.
//!
//! Builds a name-tagging model from frequency-labeled corpus files and
//! writes it zstd-compressed to disk.

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use csv_core::ReadFieldResult;
use nominato::{Additive, ModelBuilder, NameField, SharedCountPolicy, TokenizerConfig, Topology};

#[derive(Parser, Debug)]
#[clap(name = "train", about = "Trains a name-tagging model from frequency data")]
struct Args {
    /// Given-name corpus (TSV: text, frequency).
    #[clap(short = 'f', long)]
    first_names: PathBuf,

    /// First-surname corpus (TSV: text, frequency).
    #[clap(short = '1', long)]
    last_names_1: PathBuf,

    /// Second-surname corpus (TSV: text, frequency).
    #[clap(short = '2', long)]
    last_names_2: PathBuf,

    /// Corpus of surnames whose frequency belongs to both surname slots at
    /// once (TSV: text, frequency).
    #[clap(short = 'b', long)]
    both_last_names: Option<PathBuf>,

    /// Drops shared surname counts instead of adding them to both slots.
    #[clap(long)]
    ignore_shared: bool,

    /// A file to which the model is output. The file is compressed by zstd.
    #[clap(short = 'o', long)]
    model_out: PathBuf,

    /// Number of trailing characters kept as the symbol of a name word.
    #[clap(short = 'k', long, default_value = "4")]
    suffix_len: usize,

    /// Case folding applied after accent stripping. Choices are lower,
    /// upper, and none.
    #[clap(short = 'c', long, default_value = "lower")]
    case: String,

    /// State ordering of the model. Choices are forename-first and
    /// surname-first.
    #[clap(short = 't', long, default_value = "forename-first")]
    topology: String,

    /// File with one particle phrase per line, replacing the default set.
    #[clap(short = 'p', long)]
    particles: Option<PathBuf>,

    /// Weight used to seed the particle states, so corpora without
    /// particle occurrences still train them. Zero disables seeding.
    #[clap(long, default_value = "1.0")]
    particle_seed: f64,

    /// Additive-smoothing pseudo-count. Zero keeps the plain zero-fill
    /// vocabulary extension.
    #[clap(long, default_value = "0.0")]
    alpha: f64,

    /// Compression level of zstd.
    #[clap(long, default_value = "19")]
    zstd_level: i32,
}

enum CorpusKind {
    Field(NameField),
    SharedSurname,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = TokenizerConfig::default();
    config.suffix_len = args.suffix_len;
    config.case = args.case.parse()?;
    if let Some(path) = &args.particles {
        config.particles = read_particles(path)?;
    }
    let topology: Topology = args.topology.parse()?;

    let mut builder = ModelBuilder::new(config, topology)?;
    if args.ignore_shared {
        builder = builder.shared_count_policy(SharedCountPolicy::Ignore);
    }
    if args.alpha > 0.0 {
        builder = builder.smoothing(Additive { alpha: args.alpha });
    }

    eprintln!("Reading corpora...");
    add_corpus(
        &mut builder,
        CorpusKind::Field(NameField::FirstName),
        &args.first_names,
    )?;
    add_corpus(
        &mut builder,
        CorpusKind::Field(NameField::LastName1),
        &args.last_names_1,
    )?;
    add_corpus(
        &mut builder,
        CorpusKind::Field(NameField::LastName2),
        &args.last_names_2,
    )?;
    if let Some(path) = &args.both_last_names {
        add_corpus(&mut builder, CorpusKind::SharedSurname, path)?;
    }
    if args.particle_seed > 0.0 {
        builder.seed_particles(args.particle_seed);
    }

    eprintln!("Training the model...");
    let model = builder.build()?;

    eprintln!("Writing the model...");
    let dir = args.model_out.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    let mut encoder = zstd::Encoder::new(tmp, args.zstd_level)?;
    model.write(&mut encoder)?;
    let tmp = encoder.finish()?;
    tmp.persist(&args.model_out)?;
    eprintln!("Wrote the model to {:?}", args.model_out);

    Ok(())
}

fn add_corpus(
    builder: &mut ModelBuilder,
    kind: CorpusKind,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let rdr = BufReader::new(File::open(path)?);
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_tsv_row(&line);
        let weight = match fields.get(1) {
            Some(f) if !f.is_empty() => f.parse::<f64>()?,
            _ => 1.0,
        };
        match kind {
            CorpusKind::Field(field) => builder.add_entry(field, &fields[0], weight),
            CorpusKind::SharedSurname => builder.add_shared_surname(&fields[0], weight),
        }
    }
    Ok(())
}

fn read_particles(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let rdr = BufReader::new(File::open(path)?);
    let mut particles = vec![];
    for line in rdr.lines() {
        let line = line?;
        let phrase = line.trim();
        if !phrase.is_empty() {
            particles.push(phrase.to_string());
        }
    }
    Ok(particles)
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
