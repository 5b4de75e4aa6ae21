fn main() {
    #[cfg(feature = "cli")]
    xfth::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("xfth: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
