mod cli;
mod commands;

fn main() {
    cli::run();
}
