fn main() {
    // ESP-IDF link arguments are only needed for the device build; host
    // tests build without the `espidf` feature.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
