//! Typed values for the flags of the wrapped tools.
//!
//! Every type here renders (via [`Display`](fmt::Display)) to the exact string the
//! external tool expects on its command line, and parses back from it via
//! [`FromStr`]. The spellings are a contract with the tools, typos included.
//!
//! ```
//! use learn_psdd::options::{OpTypes, SaveFrequency, Smoothing};
//!
//! assert_eq!(Smoothing::default().to_string(), "l-1");
//! assert_eq!(Smoothing::ModelCountLaplace(0.5).to_string(), "mc-l-0.5");
//! assert_eq!(OpTypes::default().to_string(), "clone-3,split-1");
//! assert_eq!("all-10".parse::<SaveFrequency>().unwrap(), SaveFrequency::All(10));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

fn invalid(what: &'static str, value: &str) -> Error {
    Error::InvalidValue {
        what,
        value: value.to_string(),
    }
}

fn parse_num<T: FromStr>(what: &'static str, whole: &str, num: &str) -> Result<T, Error> {
    num.parse().map_err(|_| invalid(what, whole))
}

/// Vtree construction heuristic of `learnVtree --vtreeMethod`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum VtreeMethod {
    /// Left linear vtree, random order.
    LeftLinearRandom,
    /// Left linear vtree, variable order.
    LeftLinearOrdered,
    /// Balanced vtree, top-down split minimizing mutual information (exhaustive search).
    PairwiseWeights,
    /// Balanced vtree, random order.
    BalancedRandom,
    /// Right linear vtree, variable order.
    RightLinearOrdered,
    /// Right linear vtree, random order.
    RightLinearRandom,
    /// Balanced vtree, variable order.
    BalancedOrdered,
    /// Balanced vtree, bottom-up pair matching maximizing mutual information (blossomV).
    #[default]
    MiBlossom,
    /// Same as [`VtreeMethod::MiBlossom`] with greedy pair selection.
    MiGreedyBottomUp,
    /// Balanced vtree, top-down split minimizing mutual information (metis).
    MiMetis,
}

impl VtreeMethod {
    pub const ALL: [VtreeMethod; 10] = [
        VtreeMethod::LeftLinearRandom,
        VtreeMethod::LeftLinearOrdered,
        VtreeMethod::PairwiseWeights,
        VtreeMethod::BalancedRandom,
        VtreeMethod::RightLinearOrdered,
        VtreeMethod::RightLinearRandom,
        VtreeMethod::BalancedOrdered,
        VtreeMethod::MiBlossom,
        VtreeMethod::MiGreedyBottomUp,
        VtreeMethod::MiMetis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VtreeMethod::LeftLinearRandom => "leftLinear-rand",
            // Spelled this way by the learner.
            VtreeMethod::LeftLinearOrdered => "leftLinea-ord",
            VtreeMethod::PairwiseWeights => "pairwiseWeights",
            VtreeMethod::BalancedRandom => "balanced-rand",
            VtreeMethod::RightLinearOrdered => "rightLinear-ord",
            VtreeMethod::RightLinearRandom => "rightLinear-rand",
            VtreeMethod::BalancedOrdered => "balanced-ord",
            VtreeMethod::MiBlossom => "miBlossom",
            VtreeMethod::MiGreedyBottomUp => "miGreedyBU",
            VtreeMethod::MiMetis => "miMetis",
        }
    }
}

impl fmt::Display for VtreeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VtreeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VtreeMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| invalid("vtree method", s))
    }
}

/// Initial vtree shape for the SDD compiler (`sdd -t`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum InitialVtree {
    Left,
    Right,
    Vertical,
    Balanced,
    #[default]
    Random,
}

impl fmt::Display for InitialVtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InitialVtree::Left => "left",
            InitialVtree::Right => "right",
            InitialVtree::Vertical => "vertical",
            InitialVtree::Balanced => "balanced",
            InitialVtree::Random => "random",
        };
        f.write_str(s)
    }
}

impl FromStr for InitialVtree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(InitialVtree::Left),
            "right" => Ok(InitialVtree::Right),
            "vertical" => Ok(InitialVtree::Vertical),
            "balanced" => Ok(InitialVtree::Balanced),
            "random" => Ok(InitialVtree::Random),
            _ => Err(invalid("initial vtree type", s)),
        }
    }
}

/// Parameter smoothing scheme, rendered as `<kind>-<weight>`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Smoothing {
    /// `l-<m>`: Laplace smoothing, weighted with `m`.
    Laplace(f64),
    /// `m-<m>`: m-estimator smoothing.
    MEstimator(f64),
    /// `mc-<m>`: model count as pseudo count, weighted with `m`.
    ModelCount(f64),
    /// `mc-l-<m>`: Laplace smoothing, weighted with model count and `m`.
    ModelCountLaplace(f64),
    /// `mc-m-<m>`: m-estimator, weighted with model count.
    ModelCountMEstimator(f64),
    /// `no`
    None,
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Laplace(1.0)
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Smoothing::Laplace(m) => write!(f, "l-{}", m),
            Smoothing::MEstimator(m) => write!(f, "m-{}", m),
            Smoothing::ModelCount(m) => write!(f, "mc-{}", m),
            Smoothing::ModelCountLaplace(m) => write!(f, "mc-l-{}", m),
            Smoothing::ModelCountMEstimator(m) => write!(f, "mc-m-{}", m),
            Smoothing::None => write!(f, "no"),
        }
    }
}

impl FromStr for Smoothing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "smoothing";
        if s == "no" {
            return Ok(Smoothing::None);
        }
        // Longest prefixes first: "mc-l-" and "mc-m-" also start with "mc-".
        let weight = |rest: &str| -> Result<f64, Error> {
            let m: f64 = parse_num(WHAT, s, rest)?;
            if m.is_finite() && m >= 0.0 {
                Ok(m)
            } else {
                Err(invalid(WHAT, s))
            }
        };
        if let Some(rest) = s.strip_prefix("mc-l-") {
            Ok(Smoothing::ModelCountLaplace(weight(rest)?))
        } else if let Some(rest) = s.strip_prefix("mc-m-") {
            Ok(Smoothing::ModelCountMEstimator(weight(rest)?))
        } else if let Some(rest) = s.strip_prefix("mc-") {
            Ok(Smoothing::ModelCount(weight(rest)?))
        } else if let Some(rest) = s.strip_prefix("l-") {
            Ok(Smoothing::Laplace(weight(rest)?))
        } else if let Some(rest) = s.strip_prefix("m-") {
            Ok(Smoothing::MEstimator(weight(rest)?))
        } else {
            Err(invalid(WHAT, s))
        }
    }
}

/// Structure search operators, `clone-<k>,split-<k>`.
///
/// In `split-k`, `k` is the number of splits. In `clone-k`, `k` is the maximum
/// number of parents redirected to the clone.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OpTypes {
    pub clone_k: u32,
    pub split_k: u32,
}

impl Default for OpTypes {
    fn default() -> Self {
        Self { clone_k: 3, split_k: 1 }
    }
}

impl fmt::Display for OpTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clone-{},split-{}", self.clone_k, self.split_k)
    }
}

impl FromStr for OpTypes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "operator types";
        let (clone, split) = s.split_once(',').ok_or_else(|| invalid(WHAT, s))?;
        let clone_k = clone.strip_prefix("clone-").ok_or_else(|| invalid(WHAT, s))?;
        let split_k = split.strip_prefix("split-").ok_or_else(|| invalid(WHAT, s))?;
        Ok(OpTypes {
            clone_k: parse_num(WHAT, s, clone_k)?,
            split_k: parse_num(WHAT, s, split_k)?,
        })
    }
}

/// Completion heuristic of the PSDD search learner.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Completion {
    Complete,
    Min,
    MaxDepth(u32),
    MaxEdges(u32),
}

impl Default for Completion {
    fn default() -> Self {
        Completion::MaxDepth(3)
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Complete => write!(f, "complete"),
            Completion::Min => write!(f, "min"),
            Completion::MaxDepth(k) => write!(f, "maxDepth-{}", k),
            Completion::MaxEdges(k) => write!(f, "maxEdges-{}", k),
        }
    }
}

impl FromStr for Completion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "completion";
        match s {
            "complete" => Ok(Completion::Complete),
            "min" => Ok(Completion::Min),
            _ => {
                if let Some(k) = s.strip_prefix("maxDepth-") {
                    Ok(Completion::MaxDepth(parse_num(WHAT, s, k)?))
                } else if let Some(k) = s.strip_prefix("maxEdges-") {
                    Ok(Completion::MaxEdges(parse_num(WHAT, s, k)?))
                } else {
                    Err(invalid(WHAT, s))
                }
            }
        }
    }
}

/// Scoring function used to rank candidate operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Scorer {
    /// `dll`: log-likelihood gain.
    LogLikelihood,
    /// `dll/ds`: log-likelihood gain per size increase.
    #[default]
    LogLikelihoodPerSize,
}

impl fmt::Display for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scorer::LogLikelihood => write!(f, "dll"),
            Scorer::LogLikelihoodPerSize => write!(f, "dll/ds"),
        }
    }
}

impl FromStr for Scorer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dll" => Ok(Scorer::LogLikelihood),
            "dll/ds" => Ok(Scorer::LogLikelihoodPerSize),
            _ => Err(invalid("scorer", s)),
        }
    }
}

/// Iteration cap. `Unbounded` means the `--maxIt` flag is left out.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum MaxIterations {
    #[default]
    Unbounded,
    Limit(u64),
}

impl MaxIterations {
    pub fn limit(self) -> Option<u64> {
        match self {
            MaxIterations::Unbounded => None,
            MaxIterations::Limit(n) => Some(n),
        }
    }
}

impl FromStr for MaxIterations {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(MaxIterations::Unbounded),
            _ => Ok(MaxIterations::Limit(parse_num("max iterations", s, s)?)),
        }
    }
}

/// How the learner saves intermediate PSDDs: a save attempt every `k` iterations,
/// keeping either only the best model or all of them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SaveFrequency {
    Best(u32),
    All(u32),
}

impl Default for SaveFrequency {
    fn default() -> Self {
        SaveFrequency::Best(3)
    }
}

impl fmt::Display for SaveFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveFrequency::Best(k) => write!(f, "best-{}", k),
            SaveFrequency::All(k) => write!(f, "all-{}", k),
        }
    }
}

impl FromStr for SaveFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "save frequency";
        if let Some(k) = s.strip_prefix("best-") {
            Ok(SaveFrequency::Best(parse_num(WHAT, s, k)?))
        } else if let Some(k) = s.strip_prefix("all-") {
            Ok(SaveFrequency::All(parse_num(WHAT, s, k)?))
        } else {
            Err(invalid(WHAT, s))
        }
    }
}
