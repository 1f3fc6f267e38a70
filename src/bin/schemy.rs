use std::env;
use std::fs;
use std::process;

use schemy::{Error, SchemyContext};

/// Loads one file. A failing top-level form is reported and the next one
/// runs anyway; only a file that can't be read or parsed stops the load.
fn load(ctx: &mut SchemyContext, filename: &str) -> Result<(), Error> {
    let contents = fs::read_to_string(filename)
        .map_err(|e| Error::os_error(format!("Unable to read file: {filename}. Error: {e}")))?;
    let forms = ctx.read_string(&contents)?;
    for form in &forms {
        if let Err(e) = ctx.eval(form) {
            print!("{}", e.format());
        }
    }
    Ok(())
}

fn main() {
    let mut ctx = SchemyContext::new();

    let mut failed = false;
    for arg in env::args().skip(1) {
        if let Err(e) = load(&mut ctx, &arg) {
            print!("{}", e.format());
            failed = true;
        }
    }
    if failed {
        process::exit(-1);
    }
}
