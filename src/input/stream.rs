//! Code for reading the streams file.
use super::{input_err_msg, read_csv};
use crate::id::collect_by_id;
use crate::stream::{Stream, StreamMap};
use anyhow::{Context, Result};
use std::path::Path;

const STREAMS_FILE_NAME: &str = "streams.csv";

/// Read streams from the `streams.csv` file in the model directory
pub fn read_streams(model_dir: &Path) -> Result<StreamMap> {
    let file_path = model_dir.join(STREAMS_FILE_NAME);
    let streams: Vec<Stream> = read_csv(&file_path)?;
    collect_by_id(streams).with_context(|| input_err_msg(&file_path))
}
