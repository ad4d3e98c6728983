fn main() {
    #[cfg(feature = "cli")]
    actpack::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("actpack: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
