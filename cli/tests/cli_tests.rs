#[test]
fn demography() {
    trycmd::TestCases::new()
        .case("tests/demography/*.toml")
        .default_bin_name("popsim");
}

#[test]
fn explore() {
    trycmd::TestCases::new()
        .case("tests/explore/*.toml")
        .default_bin_name("popsim");
}

#[test]
fn priors() {
    trycmd::TestCases::new()
        .case("tests/priors/*.toml")
        .default_bin_name("popsim");
}

#[test]
fn simulate() {
    trycmd::TestCases::new()
        .case("tests/simulate/*.toml")
        .default_bin_name("popsim");
}
