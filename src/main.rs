use treelock::ui::output;

fn main() {
    if let Err(err) = treelock::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
