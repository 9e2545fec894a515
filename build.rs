fn main() {
    println!("cargo:rerun-if-env-changed=UVMON_WIFI_SSID_1");
    println!("cargo:rerun-if-env-changed=UVMON_WIFI_PASS_1");
    println!("cargo:rerun-if-env-changed=UVMON_WIFI_SSID_2");
    println!("cargo:rerun-if-env-changed=UVMON_WIFI_PASS_2");

    // ESP-IDF link arguments are only needed for the firmware binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
