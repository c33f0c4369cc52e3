fn main() {
    // Re-exports the ESP-IDF build environment to rustc when cross-compiling
    // for the device; emits nothing on host builds.
    embuild::espidf::sysenv::output();
}
