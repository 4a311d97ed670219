use seoscope::commands::command_argument_builder;
use seoscope::handlers::{handle_crawl, init_tracing, print_prompt_hint, report_fatal};
use seoscope_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let exit_code = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => match handle_crawl(primary_command, quiet).await {
            Ok(code) => code,
            Err(e) => report_fatal(&e),
        },
        None => {
            print_prompt_hint();
            0
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    std::process::exit(exit_code);
}
