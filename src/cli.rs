use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Translate stack VM code into assembly")]
pub struct Cli {
    /// Input .vm file, or a directory of .vm files forming one program
    pub input: PathBuf,
    /// Output .asm file (defaults to `<stem>.asm` or `<dir>/<dir>.asm`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Emit the bootstrap even when translating a single file
    #[arg(long)]
    pub program: bool,
    /// Also write the classified commands of every unit as JSON
    #[arg(long, value_name = "PATH")]
    pub dump_commands: Option<PathBuf>,
}
