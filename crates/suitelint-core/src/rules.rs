//! The closed catalog of diagnostic rules.
//!
//! Warning-level rules use W-prefixed ids, error-level rules E-prefixed.
//! The numbering groups rules by family: W900x flakiness, W901x test body
//! quality, W902x fixture definitions, E903x/W903x fixture interactions.

use serde::{Deserialize, Serialize};

/// A diagnostic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    // Flakiness
    TimeSleep,
    RawFileIo,
    NetworkImport,
    CwdDependency,
    MysteryGuest,

    // Test body quality
    TestLogic,
    MagicAssert,
    SuboptimalAssert,
    MissingAssertion,
    MockOnlyVerification,
    MissingBddScenario,
    PropertyTestHint,
    AssertionRoulette,
    RawExceptionHandling,

    // Fixture definitions
    AutouseFixture,
    DbCommitWithoutCleanup,
    ParametrizeEmpty,
    ParametrizeDuplicate,
    ParametrizeExplosion,
    SharedStateAccess,
    FixtureIoWithoutTmpPath,

    // Fixture interactions (cross-file)
    InvalidScopeDependency,
    ShadowedFixture,
    UnusedFixture,
    StatefulSessionFixture,
    OverlyBroadScope,
}

impl Rule {
    /// Stable message id, pylint-style.
    pub fn id(&self) -> &'static str {
        match self {
            Rule::TimeSleep => "W9001",
            Rule::RawFileIo => "W9002",
            Rule::NetworkImport => "W9003",
            Rule::CwdDependency => "W9004",
            Rule::MysteryGuest => "W9005",
            Rule::TestLogic => "W9011",
            Rule::MagicAssert => "W9012",
            Rule::SuboptimalAssert => "W9013",
            Rule::MissingAssertion => "E9014",
            Rule::MockOnlyVerification => "W9015",
            Rule::MissingBddScenario => "W9016",
            Rule::PropertyTestHint => "W9017",
            Rule::AssertionRoulette => "W9019",
            Rule::RawExceptionHandling => "W9020",
            Rule::AutouseFixture => "W9021",
            Rule::DbCommitWithoutCleanup => "W9022",
            Rule::ParametrizeEmpty => "W9025",
            Rule::ParametrizeDuplicate => "W9026",
            Rule::ParametrizeExplosion => "W9027",
            Rule::SharedStateAccess => "W9029",
            Rule::FixtureIoWithoutTmpPath => "W9030",
            Rule::InvalidScopeDependency => "E9032",
            Rule::ShadowedFixture => "W9033",
            Rule::UnusedFixture => "W9034",
            Rule::StatefulSessionFixture => "E9035",
            Rule::OverlyBroadScope => "W9024",
        }
    }

    /// Human-readable symbol, used for rule suppression in config.
    pub fn symbol(&self) -> &'static str {
        match self {
            Rule::TimeSleep => "time-sleep-in-test",
            Rule::RawFileIo => "raw-file-io",
            Rule::NetworkImport => "network-import",
            Rule::CwdDependency => "cwd-dependency",
            Rule::MysteryGuest => "mystery-guest",
            Rule::TestLogic => "conditional-test-logic",
            Rule::MagicAssert => "magic-assert",
            Rule::SuboptimalAssert => "suboptimal-assert",
            Rule::MissingAssertion => "missing-assertion",
            Rule::MockOnlyVerification => "mock-only-verification",
            Rule::MissingBddScenario => "missing-bdd-scenario",
            Rule::PropertyTestHint => "property-test-hint",
            Rule::AssertionRoulette => "assertion-roulette",
            Rule::RawExceptionHandling => "raw-exception-handling",
            Rule::AutouseFixture => "autouse-fixture",
            Rule::DbCommitWithoutCleanup => "db-commit-without-cleanup",
            Rule::ParametrizeEmpty => "parametrize-empty",
            Rule::ParametrizeDuplicate => "parametrize-duplicate",
            Rule::ParametrizeExplosion => "parametrize-explosion",
            Rule::SharedStateAccess => "shared-state-access",
            Rule::FixtureIoWithoutTmpPath => "fixture-io-without-tmp-path",
            Rule::InvalidScopeDependency => "invalid-scope-dependency",
            Rule::ShadowedFixture => "shadowed-fixture",
            Rule::UnusedFixture => "unused-fixture",
            Rule::StatefulSessionFixture => "stateful-session-fixture",
            Rule::OverlyBroadScope => "overly-broad-scope",
        }
    }

    /// Rationale shown in help output.
    pub fn description(&self) -> &'static str {
        match self {
            Rule::TimeSleep => {
                "Hard-coded waits create slow, unreliable tests. Poll for the \
                 actual condition instead."
            }
            Rule::RawFileIo => {
                "Direct filesystem I/O makes tests stateful and \
                 environment-dependent. Prefer the tmp_path fixture."
            }
            Rule::NetworkImport => {
                "Network-dependent tests are inherently flaky. Mock the \
                 network or move these to an integration suite."
            }
            Rule::CwdDependency => {
                "Tests that rely on the current working directory fail when \
                 run from a different directory."
            }
            Rule::MysteryGuest => {
                "File I/O without a resource fixture hides the test's real \
                 inputs outside the test."
            }
            Rule::TestLogic => {
                "Conditional logic or loops in a test body indicate the test \
                 covers multiple paths at once."
            }
            Rule::MagicAssert => {
                "Unexplained literal values in assertions are unreadable and \
                 brittle. Extract them to named constants."
            }
            Rule::SuboptimalAssert => {
                "Plain `assert x == y` produces rich diffs; wrapping the \
                 comparison in assertTrue-style helpers hides them."
            }
            Rule::MissingAssertion => {
                "A test without assertions verifies nothing."
            }
            Rule::MockOnlyVerification => {
                "Verifying only mock interactions couples the test to the \
                 implementation; assert on observable state as well."
            }
            Rule::MissingBddScenario => {
                "No scenario marker or Given/When/Then docstring ties this \
                 test back to a behavior."
            }
            Rule::PropertyTestHint => {
                "Large hand-written parameter tables often encode a property \
                 better expressed with property-based testing."
            }
            Rule::AssertionRoulette => {
                "Many assertions in one test make failures hard to attribute."
            }
            Rule::RawExceptionHandling => {
                "Raw try/except in a test swallows failures; use \
                 pytest.raises to assert on exceptions."
            }
            Rule::AutouseFixture => {
                "autouse fixtures hide test dependencies; make setup explicit \
                 in test signatures."
            }
            Rule::DbCommitWithoutCleanup => {
                "A fixture that commits without rollback or teardown leaks \
                 state between tests."
            }
            Rule::ParametrizeEmpty => {
                "An empty or single-value parameter set adds indirection \
                 without coverage."
            }
            Rule::ParametrizeDuplicate => {
                "Duplicate parameter values run the same case twice."
            }
            Rule::ParametrizeExplosion => {
                "Stacked parametrize decorators multiply into an excessive \
                 number of test cases."
            }
            Rule::SharedStateAccess => {
                "Reading or mutating shared state couples tests to execution \
                 order and breaks parallel runs."
            }
            Rule::FixtureIoWithoutTmpPath => {
                "A fixture doing file I/O outside tmp_path can collide with \
                 itself under parallel execution."
            }
            Rule::InvalidScopeDependency => {
                "A fixture cannot depend on a fixture with a narrower scope; \
                 the dependency would not live long enough."
            }
            Rule::ShadowedFixture => {
                "Multiple definitions of one fixture name resolve by \
                 directory proximity, a common source of confusion."
            }
            Rule::UnusedFixture => {
                "Dead fixtures add maintenance burden; remove them or \
                 document why they stay."
            }
            Rule::StatefulSessionFixture => {
                "A session-scoped mutable value mutated by tests bleeds state \
                 across the whole run."
            }
            Rule::OverlyBroadScope => {
                "The fixture's usage fits a narrower scope; broad scopes keep \
                 state alive longer than needed."
            }
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id(), self.symbol())
    }
}
