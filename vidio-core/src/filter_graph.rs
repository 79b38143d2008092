//! Filter-graph builder for FFmpeg's `-filter_complex` mini-language.
//!
//! A [`FilterGraph`] is an ordered list of stages. Each stage reads one or
//! more pads, runs a [`FilterChain`] and writes a single named label. Labels
//! are checked as they are added, so a graph that renders is always
//! well-formed: labels are unique, every input refers to a source stream or
//! an earlier label, and exactly one stage writes the reserved output label.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors raised while assembling a filter graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("label [{0}] is defined twice")]
    DuplicateLabel(String),

    #[error("label [{0}] is used before it is defined")]
    UndefinedLabel(String),

    #[error("label [{0}] is consumed more than once")]
    LabelReused(String),

    #[error("{filter} needs at least 2 inputs, got {got}")]
    TooFewInputs { filter: String, got: usize },

    #[error("stage writing [{0}] has no filters")]
    EmptyChain(String),

    #[error("graph has no stage writing the output label")]
    Unterminated,

    #[error("graph already wrote the output label")]
    AlreadyTerminated,
}

/// A filter input or output pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pad {
    /// Video stream of the `input`-th `-i` declaration, e.g. `[1:v]`.
    Video(usize),
    /// Intermediate label produced by an earlier stage.
    Label(String),
}

impl Pad {
    pub fn video(input: usize) -> Self {
        Pad::Video(input)
    }

    pub fn label(name: impl Into<String>) -> Self {
        Pad::Label(name.into())
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Video(input) => write!(f, "[{}:v]", input),
            Pad::Label(name) => write!(f, "[{}]", name),
        }
    }
}

/// Comma-separated sequence of filters, usable on its own with `-vf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter expression
    pub fn then(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Append every filter of another chain
    pub fn extend(mut self, other: &FilterChain) -> Self {
        self.filters.extend(other.filters.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filters.join(","))
    }
}

#[derive(Debug, Clone)]
struct Stage {
    inputs: Vec<Pad>,
    chain: FilterChain,
    output: String,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{}", pad)?;
        }
        write!(f, "{}[{}]", self.chain, self.output)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    stages: Vec<Stage>,
    defined: HashSet<String>,
    consumed: HashSet<String>,
    terminated: bool,
}

impl FilterGraph {
    /// Label of the graph's single video output, selected with `-map [v]`.
    pub const OUTPUT: &'static str = "v";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage reading `inputs` through `chain` into `label`.
    ///
    /// Writing [`FilterGraph::OUTPUT`] terminates the graph; no stage may
    /// follow it.
    pub fn stage(
        &mut self,
        inputs: impl IntoIterator<Item = Pad>,
        chain: FilterChain,
        label: impl Into<String>,
    ) -> Result<Pad, GraphError> {
        let label = label.into();
        let inputs: Vec<Pad> = inputs.into_iter().collect();

        if self.terminated {
            return Err(GraphError::AlreadyTerminated);
        }
        if chain.is_empty() {
            return Err(GraphError::EmptyChain(label));
        }
        if self.defined.contains(&label) {
            return Err(GraphError::DuplicateLabel(label));
        }

        let mut seen = HashSet::new();
        for pad in &inputs {
            if let Pad::Label(name) = pad {
                if !self.defined.contains(name) {
                    return Err(GraphError::UndefinedLabel(name.clone()));
                }
                if self.consumed.contains(name) || !seen.insert(name.clone()) {
                    return Err(GraphError::LabelReused(name.clone()));
                }
            }
        }
        self.consumed.extend(seen);

        self.terminated = label == Self::OUTPUT;
        self.defined.insert(label.clone());
        self.stages.push(Stage {
            inputs,
            chain,
            output: label.clone(),
        });
        Ok(Pad::Label(label))
    }

    /// Add a compositing stage such as `hstack` or `xstack`.
    ///
    /// The `inputs=` argument is derived from the pads supplied, so the
    /// declared count always matches. Compositing needs two or more inputs.
    pub fn composite(
        &mut self,
        filter: &str,
        options: &[String],
        inputs: Vec<Pad>,
        label: impl Into<String>,
    ) -> Result<Pad, GraphError> {
        if inputs.len() < 2 {
            return Err(GraphError::TooFewInputs {
                filter: filter.to_string(),
                got: inputs.len(),
            });
        }
        let mut expr = format!("{}=inputs={}", filter, inputs.len());
        for option in options {
            expr.push(':');
            expr.push_str(option);
        }
        self.stage(inputs, FilterChain::new().then(expr), label)
    }

    /// Stack `inputs` side by side or on top of each other.
    ///
    /// A single input is passed through with `copy`, since the stacking
    /// filters need at least two.
    pub fn stack(
        &mut self,
        direction: Stack,
        mut inputs: Vec<Pad>,
        label: impl Into<String>,
    ) -> Result<Pad, GraphError> {
        if inputs.len() == 1 {
            let only = inputs.remove(0);
            return self.stage([only], FilterChain::new().then("copy"), label);
        }
        self.composite(direction.filter_name(), &[], inputs, label)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Labels in the order they were defined.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.output.as_str())
    }

    /// Serialize the graph as a `-filter_complex` argument.
    pub fn render(&self) -> Result<String, GraphError> {
        if !self.terminated {
            return Err(GraphError::Unterminated);
        }
        Ok(self
            .stages
            .iter()
            .map(|stage| stage.to_string())
            .collect::<Vec<_>>()
            .join(";"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    Horizontal,
    Vertical,
}

impl Stack {
    pub fn filter_name(&self) -> &'static str {
        match self {
            Stack::Horizontal => "hstack",
            Stack::Vertical => "vstack",
        }
    }
}
