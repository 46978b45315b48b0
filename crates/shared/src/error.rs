use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage '{input}' (expected one of input, split, map, shuffle, reduce, output or 1-6)")]
pub struct ParseStageError {
    pub input: String,
}

impl ParseStageError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module '{input}' (expected one of hdfs, mapreduce, yarn, hbase, hive)")]
pub struct ParseModuleError {
    pub input: String,
}

impl ParseModuleError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
