use std::process;

pub fn print_config_template() {
    println!("{}", include_str!("../netlevel-config-sample.toml"));
    process::exit(0);
}
