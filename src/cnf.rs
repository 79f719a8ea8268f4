//! Constraint files in DIMACS CNF.
//!
//! Format:
//! - Comments start with `c`
//! - Problem line: `p cnf <num_vars> <num_clauses>`
//! - Clauses are space-separated non-zero literals terminated by `0` (a clause
//!   may span several lines)
//! - A line starting with `%` ends the input (SATLIB files)
//!
//! Constraints are checked here before they reach the SDD compiler, which
//! reports malformed input poorly.
//!
//! ```
//! use learn_psdd::cnf::Cnf;
//!
//! // Variables 1..4 are one-hot encoded.
//! let cnf = Cnf::one_hot(4, &[vec![1, 2, 3, 4]]).unwrap();
//! assert_eq!(cnf.num_clauses(), 7);
//! assert!(cnf.to_dimacs().contains("p cnf 4 7\n1 2 3 4 0\n-1 -2 0\n"));
//! ```

use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

pub type Clause = Vec<i32>;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Cnf {
    num_vars: u32,
    clauses: Vec<Clause>,
    comments: Vec<String>,
}

fn malformed(line: usize, message: impl Into<String>) -> Error {
    Error::Cnf {
        line,
        message: message.into(),
    }
}

impl Cnf {
    /// An empty formula over `num_vars` variables.
    pub fn new(num_vars: u32) -> Self {
        Self {
            num_vars,
            ..Self::default()
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Adds a clause. Literals must be non-zero and refer to declared variables.
    pub fn add_clause(&mut self, clause: impl IntoIterator<Item = i32>) -> Result<()> {
        let clause: Clause = clause.into_iter().collect();
        self.check_clause(&clause, 0)?;
        self.clauses.push(clause);
        Ok(())
    }

    fn check_clause(&self, clause: &[i32], line: usize) -> Result<()> {
        if clause.is_empty() {
            return Err(malformed(line, "empty clause"));
        }
        for &lit in clause {
            if lit == 0 || lit.unsigned_abs() > self.num_vars {
                return Err(malformed(
                    line,
                    format!("literal {} out of range 1..={}", lit, self.num_vars),
                ));
            }
        }
        Ok(())
    }

    /// Adds "exactly one of `group`": one at-least-one clause plus pairwise exclusions.
    pub fn add_exactly_one(&mut self, group: &[u32]) -> Result<()> {
        let mut lits = Vec::with_capacity(group.len());
        for &v in group {
            let lit = i32::try_from(v).map_err(|_| malformed(0, format!("variable {} too large", v)))?;
            lits.push(lit);
        }
        self.add_clause(lits.iter().copied())?;
        for (i, &a) in lits.iter().enumerate() {
            for &b in &lits[i + 1..] {
                self.add_clause([-a, -b])?;
            }
        }
        Ok(())
    }

    /// A CNF over `num_vars` variables where each group is one-hot encoded.
    pub fn one_hot(num_vars: u32, groups: &[Vec<u32>]) -> Result<Self> {
        let mut cnf = Cnf::new(num_vars);
        cnf.add_comment(format!("one-hot encoding of {} group(s)", groups.len()));
        for group in groups {
            cnf.add_exactly_one(group)?;
        }
        Ok(cnf)
    }

    /// Parses DIMACS CNF.
    ///
    /// Clauses may span lines and `%` ends the input. The clause count must
    /// match the problem line; errors carry the offending line, or 0 for the
    /// file as a whole.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut header: Option<(u32, usize)> = None;
        let mut cnf = Cnf::default();
        let mut current: Clause = Vec::new();
        let mut current_line = 0;

        for (i, line) in reader.lines().enumerate() {
            let line_num = i + 1;
            let line = line.map_err(|e| malformed(line_num, e.to_string()))?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('c') {
                cnf.comments.push(comment.trim().to_string());
                continue;
            }
            if line.starts_with('%') {
                break;
            }
            if line.starts_with('p') {
                if header.is_some() {
                    return Err(malformed(line_num, "duplicate problem line"));
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
                    return Err(malformed(line_num, "invalid problem line format"));
                }
                let vars = parts[2]
                    .parse::<u32>()
                    .map_err(|_| malformed(line_num, "invalid number of variables"))?;
                let clauses = parts[3]
                    .parse::<usize>()
                    .map_err(|_| malformed(line_num, "invalid number of clauses"))?;
                cnf.num_vars = vars;
                header = Some((vars, clauses));
                continue;
            }

            if header.is_none() {
                return Err(malformed(line_num, "clause before problem line"));
            }
            for token in line.split_whitespace() {
                let lit = token
                    .parse::<i32>()
                    .map_err(|_| malformed(line_num, format!("invalid literal {:?}", token)))?;
                if current.is_empty() {
                    current_line = line_num;
                }
                if lit == 0 {
                    let clause = std::mem::take(&mut current);
                    cnf.check_clause(&clause, current_line)?;
                    cnf.clauses.push(clause);
                } else {
                    current.push(lit);
                }
            }
        }

        if !current.is_empty() {
            return Err(malformed(current_line, "clause not terminated by 0"));
        }
        let Some((_, expected)) = header else {
            return Err(malformed(0, "missing problem line"));
        };
        if cnf.clauses.len() != expected {
            return Err(malformed(
                0,
                format!("expected {} clauses but found {}", expected, cnf.clauses.len()),
            ));
        }
        debug!("parsed CNF: {} vars, {} clauses", cnf.num_vars, cnf.clauses.len());
        Ok(cnf)
    }

    /// Reads and parses a DIMACS file.
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        Self::parse(file)
    }

    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        for comment in &self.comments {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "c {}", comment);
        }
        let _ = writeln!(out, "p cnf {} {}", self.num_vars, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                let _ = write!(out, "{} ", lit);
            }
            out.push_str("0\n");
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_dimacs()).map_err(|e| Error::io(path, e))
    }
}
