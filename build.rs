fn main() {
    // Package and toolchain details for `ohlcv-prep --version`
    built::write_built_file().expect("Failed to generate build info");
}
