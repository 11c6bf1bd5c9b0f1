use crate::api::lifecycle::DEFAULT_COMPLETION_DELAY;
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_BOOKING_COMPLETION_DELAY_SECONDS: &str = "booking-completion-delay-seconds";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub completion_delay: Duration,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let completion_delay = matches
            .get_one::<u64>(ARG_BOOKING_COMPLETION_DELAY_SECONDS)
            .copied()
            .map_or(DEFAULT_COMPLETION_DELAY, Duration::from_secs);
        Self { completion_delay }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_BOOKING_COMPLETION_DELAY_SECONDS)
            .long(ARG_BOOKING_COMPLETION_DELAY_SECONDS)
            .help("Seconds before a new booking moves from pending to completed")
            .env("KUTEERAM_BOOKING_COMPLETION_DELAY_SECONDS")
            .default_value("10")
            .value_parser(clap::value_parser!(u64)),
    )
}
