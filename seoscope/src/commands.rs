use crate::CLAP_STYLING;
use clap::{arg, command};

pub const DEFAULT_OUTPUT: &str = "seo_report.json";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("seoscope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("seoscope")
        .about("Crawl a single site and audit its on-page SEO")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug)")
                .required(false)
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl every page of a site reachable from the seed URL and write an SEO \
                report.",
                )
                .arg(
                    arg!([URL])
                        .required(false)
                        .help("The seed URL (prompted for when omitted; bare hosts get https://)"),
                )
                .arg(
                    arg!(-m --"max-pages" <NUM>)
                        .required(false)
                        .help("Maximum number of pages to analyze")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of concurrent workers, which is also the batch size")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"delay-ms" <MILLISECONDS>)
                        .required(false)
                        .help("Pause between batches in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Page fetch timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"probe-timeout" <SECONDS>)
                        .required(false)
                        .help("Broken-link probe timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"cache-probes")
                        .required(false)
                        .help("Probe each link target once per crawl instead of once per occurrence")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to save the report")
                        .default_value(DEFAULT_OUTPUT),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: json, text")
                        .value_parser(["json", "text"])
                        .default_value("json"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_crawl_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["seoscope", "crawl", "https://example.com"])
            .unwrap();
        let (name, crawl) = matches.subcommand().unwrap();
        assert_eq!(name, "crawl");
        assert_eq!(crawl.get_one::<String>("URL").unwrap(), "https://example.com");
        assert_eq!(*crawl.get_one::<usize>("max-pages").unwrap(), 50);
        assert_eq!(*crawl.get_one::<usize>("threads").unwrap(), 5);
        assert_eq!(*crawl.get_one::<u64>("delay-ms").unwrap(), 1000);
        assert_eq!(crawl.get_one::<String>("output").unwrap(), DEFAULT_OUTPUT);
        assert_eq!(crawl.get_one::<String>("format").unwrap(), "json");
        assert!(!crawl.get_flag("cache-probes"));
    }

    #[test]
    fn test_verbosity_counts() {
        let matches = command_argument_builder()
            .try_get_matches_from(["seoscope", "crawl", "-vv"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
    }

    #[test]
    fn test_quiet_after_subcommand() {
        let matches = command_argument_builder()
            .try_get_matches_from(["seoscope", "crawl", "-q", "https://example.com"])
            .unwrap();
        assert!(matches.get_flag("quiet"));
        let (_, crawl) = matches.subcommand().unwrap();
        assert_eq!(crawl.get_one::<String>("URL").unwrap(), "https://example.com");

        let matches = command_argument_builder()
            .try_get_matches_from(["seoscope", "--quiet", "crawl", "https://example.com"])
            .unwrap();
        assert!(matches.get_flag("quiet"));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = command_argument_builder().try_get_matches_from([
            "seoscope", "crawl", "-f", "csv",
        ]);
        assert!(result.is_err());
    }
}
