fn main() {
    let cli = model_relations_graph::cli::parse();
    let code = model_relations_graph::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
