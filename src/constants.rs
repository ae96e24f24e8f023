/// Rating every team starts from on its first finished match
pub const BASELINE_RATING: f64 = 1500.0;

/// Glicko-2 starting rating deviation
pub const BASELINE_RD: f64 = 350.0;

/// Glicko-2 starting volatility
pub const BASELINE_VOLATILITY: f64 = 0.06;

/// Elo K-factor before the margin-of-victory multiplier
pub const ELO_K_FACTOR: f64 = 32.0;

/// Scale applied to ln(|margin| + 1)
pub const MOV_SCALE: f64 = 0.8;

/// Logistic divisor of the Elo expected-score curve
pub const ELO_DIVISOR: f64 = 400.0;

/// Conversion factor between the Glicko and Glicko-2 scales (400 / ln 10)
pub const GLICKO2_SCALE: f64 = 173.7178;

/// Variance used when g(φ)²·E·(1−E) underflows to zero
pub const VARIANCE_SENTINEL: f64 = 9999.0;

/// Default Glicko-2 system constant τ for the iterative volatility solve
pub const GLICKO2_TAU: f64 = 0.5;

/// Convergence tolerance of the volatility solve
pub const GLICKO2_TOLERANCE: f64 = 1e-6;

/// A match decided by this many points or fewer is a clutch game
pub const CLUTCH_MARGIN: u32 = 3;

/// Teams rated below this can be flagged as giant killers
pub const GIANT_KILLER_CEILING: f64 = 1550.0;

/// Lower bounds of the S, A and B rating tiers
pub const TIER_S: f64 = 1550.0;
pub const TIER_A: f64 = 1515.0;
pub const TIER_B: f64 = 1485.0;

/// Points needed to win a game in the predicted scoreline
pub const GAME_POINTS: u32 = 21;

/// Teams entering the simulated knockout bracket
pub const SIMULATION_BRACKET_SIZE: usize = 8;

/// Default number of Monte Carlo iterations
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Default iterations per parallel batch
pub const DEFAULT_BATCH_SIZE: usize = 1_000;
