mod ground_truth;
mod submission;

use anyhow::Result;
use tracing::info;

use crate::cli::{ConvertGroundTruthArgs, ConvertSubmissionArgs};
use crate::util::{read_json, write_jsonl};

use ground_truth::{AnnotationDocument, convert_ground_truth};
use submission::{SubmissionDocument, convert_submission};

pub fn run_ground_truth(args: ConvertGroundTruthArgs) -> Result<()> {
    let document = read_json::<AnnotationDocument>(&args.input_path)?;
    info!(
        input = %args.input_path.display(),
        queries = document.queries.len(),
        "loaded annotation document"
    );

    let records = convert_ground_truth(&document);
    write_jsonl(&args.output_path, &records)?;
    info!(
        output = %args.output_path.display(),
        records = records.len(),
        "wrote temporal ground truth"
    );
    Ok(())
}

pub fn run_submission(args: ConvertSubmissionArgs) -> Result<()> {
    let document = read_json::<SubmissionDocument>(&args.input_path)?;
    info!(
        input = %args.input_path.display(),
        queries = document.queries.len(),
        "loaded submission document"
    );

    let records = convert_submission(&document)?;
    write_jsonl(&args.output_path, &records)?;
    info!(
        output = %args.output_path.display(),
        records = records.len(),
        "wrote temporal submission"
    );
    Ok(())
}
