use ghzip::{Feedback, Stage};

/// Render one status message. Progress and errors go to stderr; the
/// success line goes to stdout so it can be captured.
pub fn render(feedback: &Feedback) {
    match feedback {
        Feedback::Success(_) => println!("{feedback}"),
        Feedback::Info(_) | Feedback::Error(_) => eprintln!("{feedback}"),
    }
}

/// Status callback for a download. Fetch progress is only shown when
/// `verbose`; the other stages always are.
pub fn stage_printer(verbose: bool) -> impl FnMut(&Stage) + Send {
    move |stage: &Stage| match stage {
        Stage::Fetching { .. } if !verbose => {}
        // the caller prints the final summary or error
        Stage::Done | Stage::Failed(_) => {}
        other => render(&other.feedback()),
    }
}
