use clap::Args;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write, stdin, stdout},
    path::PathBuf,
    str::FromStr,
};

/// Input and output locations of the offline commands
#[derive(Args, Debug)]
pub struct IOArgs {
    /// The snapshot JSON file ("-" implies stdin)
    #[arg(value_parser = clap::value_parser!(PathOrStd))]
    pub input: PathOrStd,

    /// The output file ("-" implies stdout)
    #[arg(short, long, default_value = "-", value_parser = clap::value_parser!(PathOrStd))]
    pub output: PathOrStd,
}

impl IOArgs {
    /// Open the input
    pub fn read(&self) -> anyhow::Result<Box<dyn Read>> {
        self.input.read()
    }

    /// Create the output
    pub fn write(&self) -> anyhow::Result<Box<dyn Write>> {
        match &self.output {
            PathOrStd::Path(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
            PathOrStd::Std => Ok(Box::new(stdout().lock())),
        }
    }
}

/// A file path, or `-` for the standard stream
#[derive(Clone, Debug, PartialEq)]
pub enum PathOrStd {
    /// A file
    Path(PathBuf),
    /// stdin or stdout
    Std,
}

impl PathOrStd {
    /// Open for reading
    pub fn read(&self) -> anyhow::Result<Box<dyn Read>> {
        match self {
            PathOrStd::Path(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            PathOrStd::Std => Ok(Box::new(stdin().lock())),
        }
    }
}

impl FromStr for PathOrStd {
    type Err = <PathBuf as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Self::Std)
        } else {
            Ok(Self::Path(s.parse()?))
        }
    }
}
