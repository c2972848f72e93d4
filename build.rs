fn main() {
    // ESP-IDF sysenv propagation is only meaningful for device builds.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
