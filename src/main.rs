fn main() {
    #[cfg(feature = "cli")]
    datadiff::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("datadiff: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
