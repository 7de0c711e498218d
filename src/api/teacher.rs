use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::multipart::{MultipartForm, UploadedFile};
use crate::api::reports::submission_details;
use crate::api::validation::{parse_deadline, require_text, validate_payload, validate_upload_name};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::allocation::TeacherAllocationResponse;
use crate::schemas::assignment::{AssignmentResponse, TeacherAssignmentResponse};
use crate::schemas::submission::{
    AssignmentSubmissionResponse, GradeRequest, SubmissionReportResponse, SubmissionResponse,
};
use crate::schemas::user::ClassStudentResponse;
use crate::services::storage::StoredFile;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/allocations", get(list_allocations))
        .route("/classes/:class_id/students", get(class_students))
        .route("/assignments", post(create_assignment).get(list_assignments))
        .route("/assignments/:assignment_id/submissions", get(assignment_submissions))
        .route("/submissions/:submission_id/details", get(details))
        .route("/submissions/:submission_id/grade", put(grade))
}

async fn list_allocations(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherAllocationResponse>>, ApiError> {
    let rows = repositories::allocations::list_for_teacher(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list allocations"))?;
    Ok(Json(rows.into_iter().map(TeacherAllocationResponse::from_row).collect()))
}

async fn class_students(
    CurrentTeacher(teacher): CurrentTeacher,
    Path(class_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassStudentResponse>>, ApiError> {
    let allocated = repositories::allocations::teacher_teaches(state.db(), &teacher.id, &class_id, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check allocation"))?;
    if !allocated {
        return Err(ApiError::Forbidden("You are not allocated to this class"));
    }

    let students = repositories::users::list_people(state.db(), UserRole::Student, Some(&class_id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    Ok(Json(students.into_iter().map(ClassStudentResponse::from_row).collect()))
}

async fn create_assignment(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    let mut form =
        MultipartForm::read(multipart, state.settings().uploads().max_upload_bytes()).await?;

    let title = require_text(form.take_text("title"), "title")?;
    let class_id = require_text(form.take_text("class_id"), "class_id")?;
    let subject_id = require_text(form.take_text("subject_id"), "subject_id")?;
    let deadline = parse_deadline(&require_text(form.take_text("deadline"), "deadline")?)?;
    let description =
        form.take_text("description").map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

    let allocated =
        repositories::allocations::teacher_teaches(state.db(), &teacher.id, &class_id, Some(&subject_id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check allocation"))?;
    if !allocated {
        return Err(ApiError::Forbidden("You are not allocated to this class and subject"));
    }

    let question = store_optional(&state, "question_file", form.take_file("question_file")).await?;
    let solution = match store_optional(&state, "solution_file", form.take_file("solution_file")).await {
        Ok(solution) => solution,
        Err(err) => {
            discard_all(&state, &[&question]).await;
            return Err(err);
        }
    };

    let created = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            title: &title,
            description: description.as_deref(),
            question_file_url: question.as_ref().map(|f| f.url.as_str()),
            solution_file_url: solution.as_ref().map(|f| f.url.as_str()),
            deadline,
            class_id: &class_id,
            subject_id: &subject_id,
            teacher_id: &teacher.id,
            created_at: primitive_now_utc(),
        },
    )
    .await;

    let assignment = match created {
        Ok(assignment) => assignment,
        Err(err) => {
            discard_all(&state, &[&question, &solution]).await;
            return Err(ApiError::from_write(err, "Assignment already exists", "Failed to create assignment"));
        }
    };

    tracing::info!(assignment_id = %assignment.id, teacher_id = %teacher.id, "assignment created");
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

async fn store_optional(
    state: &AppState,
    field: &str,
    file: Option<UploadedFile>,
) -> Result<Option<StoredFile>, ApiError> {
    let Some(file) = file else {
        return Ok(None);
    };
    let extension = validate_upload_name(
        &file.filename,
        state.settings().uploads().allowed_extensions.as_slice(),
    )?;
    state
        .uploads()
        .save(field, &extension, &file.bytes)
        .await
        .map(Some)
        .map_err(|e| ApiError::internal(e, "Failed to store uploaded file"))
}

async fn discard_all(state: &AppState, files: &[&Option<StoredFile>]) {
    for stored in files {
        if let Some(stored) = stored {
            state.uploads().discard(stored).await;
        }
    }
}

async fn list_assignments(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherAssignmentResponse>>, ApiError> {
    let rows = repositories::assignments::list_for_teacher(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;
    Ok(Json(rows.into_iter().map(TeacherAssignmentResponse::from_row).collect()))
}

async fn assignment_submissions(
    CurrentTeacher(teacher): CurrentTeacher,
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentSubmissionResponse>>, ApiError> {
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;
    if assignment.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Access denied"));
    }

    let rows = repositories::submissions::list_for_assignment(state.db(), &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;
    Ok(Json(rows.into_iter().map(AssignmentSubmissionResponse::from_row).collect()))
}

async fn details(
    CurrentTeacher(teacher): CurrentTeacher,
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionReportResponse>, ApiError> {
    submission_details(&state, &submission_id, &teacher).await
}

async fn grade(
    CurrentTeacher(teacher): CurrentTeacher,
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let ownership = repositories::submissions::find_ownership(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    if ownership.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Access denied"));
    }
    validate_payload(&payload)?;

    let remarks = payload.teacher_remarks.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let submission = repositories::submissions::grade(
        state.db(),
        &submission_id,
        payload.final_score,
        remarks,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?
    .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    metrics::counter!("submissions_graded_total").increment(1);
    tracing::info!(submission_id = %submission.id, teacher_id = %teacher.id, "submission graded");
    Ok(Json(SubmissionResponse::from_db(submission)))
}
