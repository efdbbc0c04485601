use shellkit_seriko::{Config, NoBinds, Seriko, Source};
use shellkit_surface::parse_descriptor;
use shellkit_test_fixtures::descriptors;

/// Tree sizes of the basic fixture's surface 0 over `ticks` steps of `step` ms.
fn run(seed: u64, ticks: usize, step: i64) -> Vec<usize> {
    let text = descriptors::text("basic").expect("fixture text");
    let mut seriko = Seriko::new(parse_descriptor(&text), Config::with_seed(seed));
    seriko.get_with_elapsed(0, 0, &NoBinds);
    (0..ticks)
        .map(|_| seriko.get_with_elapsed(0, step, &NoBinds).len())
        .collect()
}

#[test]
fn same_seed_same_timeline() {
    assert_eq!(run(1234, 500, 20), run(1234, 500, 20));
}

#[test]
fn sometimes_animation_replays() {
    let sizes = run(77, 10_000, 20);
    let appearances = sizes.windows(2).filter(|w| w[0] == 1 && w[1] == 2).count();
    assert!(appearances >= 2, "appeared {appearances} times");
}

#[test]
fn user_start_of_running_animation_is_ignored() {
    let text = descriptors::text("chain").expect("fixture text");
    let mut seriko = Seriko::new(parse_descriptor(&text), Config::with_seed(1));
    seriko.get_with_elapsed(0, 0, &NoBinds);
    assert!(!seriko.activate(Source::User, 1, 0));
    assert!(seriko.activate(Source::User, 2, 0));
    assert!(!seriko.activate(Source::YenE, 2, 0));
}
