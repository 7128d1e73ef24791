//! Diesel schema for UAT workflow persistence.

diesel::table! {
    /// UAT tasks: one worker executing one test case.
    uat_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Application under test.
        app_id -> Uuid,
        /// Executed test case.
        test_case_id -> Uuid,
        /// Assigned worker.
        worker_id -> Uuid,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// When the worker started.
        started_at -> Nullable<Timestamptz>,
        /// When the task last reached `completed`.
        completed_at -> Nullable<Timestamptz>,
        /// Number of revisions requested.
        revision_count -> Int4,
        /// Revision cycle status.
        #[max_length = 32]
        revision_status -> Varchar,
        /// QA explanation for the latest revision request.
        revision_comments -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest lifecycle timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bug reports and bug revisions.
    bug_reports (id) {
        /// Bug report identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Reporting worker.
        worker_id -> Uuid,
        /// Defect description.
        description -> Text,
        /// Reproduction steps.
        steps_to_reproduce -> Text,
        /// Severity.
        #[max_length = 16]
        severity -> Varchar,
        /// Position in the revision chain.
        revision_number -> Int4,
        /// Superseded report, for revisions.
        original_bug_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// QA determinations on bug reports, unique per report.
    bug_validations (id) {
        /// Validation identifier.
        id -> Uuid,
        /// Validated bug report.
        bug_report_id -> Uuid,
        /// Deciding QA specialist.
        qa_id -> Uuid,
        /// Determination.
        #[max_length = 32]
        status -> Varchar,
        /// QA explanation.
        comments -> Text,
        /// Decision timestamp.
        validated_at -> Timestamptz,
    }
}

diesel::table! {
    /// QA determinations on tasks, unique per task and revision cycle.
    task_validations (id) {
        /// Validation identifier.
        id -> Uuid,
        /// Validated task.
        task_id -> Uuid,
        /// Deciding QA specialist.
        qa_id -> Uuid,
        /// Outcome.
        #[max_length = 32]
        outcome -> Varchar,
        /// QA explanation.
        comments -> Text,
        /// Revision cycle the decision belongs to.
        revision_cycle -> Int4,
        /// Decision timestamp.
        validated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Evidence owned by exactly one of a task or a bug report.
    test_evidence (id) {
        /// Evidence identifier.
        id -> Uuid,
        /// Owning task, for task-level evidence.
        task_id -> Nullable<Uuid>,
        /// Owning bug report, for bug-level evidence.
        bug_report_id -> Nullable<Uuid>,
        /// One-based step number.
        step_number -> Int4,
        /// Step description.
        step_description -> Text,
        /// Screenshot reference in the blob store.
        screenshot_ref -> Nullable<Text>,
        /// Free-form notes.
        notes -> Nullable<Text>,
        /// Given/When/Then context.
        #[max_length = 8]
        context -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last edit timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(bug_reports -> uat_tasks (task_id));
diesel::joinable!(bug_validations -> bug_reports (bug_report_id));
diesel::joinable!(task_validations -> uat_tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    uat_tasks,
    bug_reports,
    bug_validations,
    task_validations,
    test_evidence,
);
