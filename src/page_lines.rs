use crate::normalize::clean_line;
use crate::source::RawTextRun;

const LINE_Y_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PageLine {
    pub text: String,
    pub y: f64,
    pub x_min: f64,
    pub x_max: f64,
}

pub fn group_runs_into_lines(runs: &[RawTextRun]) -> Vec<PageLine> {
    let mut ordered: Vec<&RawTextRun> = runs
        .iter()
        .filter(|run| !run.text.trim().is_empty())
        .collect();
    if ordered.is_empty() {
        return Vec::new();
    }

    ordered.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::<PageLine>::new();
    let mut cluster: Vec<&RawTextRun> = vec![ordered[0]];
    let mut cluster_y = ordered[0].y;

    for run in ordered.into_iter().skip(1) {
        if (run.y - cluster_y).abs() <= LINE_Y_TOLERANCE {
            cluster.push(run);
        } else {
            lines.push(assemble_line(&cluster, cluster_y));
            cluster.clear();
            cluster_y = run.y;
            cluster.push(run);
        }
    }
    lines.push(assemble_line(&cluster, cluster_y));

    lines
}

fn assemble_line(cluster: &[&RawTextRun], cluster_y: f64) -> PageLine {
    let mut ordered = cluster.to_vec();
    ordered.sort_by(|a, b| a.x.total_cmp(&b.x));

    let text = clean_line(
        &ordered
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    let x_min = ordered
        .iter()
        .map(|run| run.x)
        .fold(f64::INFINITY, f64::min);
    let x_max = ordered
        .iter()
        .map(|run| run.x)
        .fold(f64::NEG_INFINITY, f64::max);

    PageLine {
        text,
        y: cluster_y,
        x_min,
        x_max,
    }
}
