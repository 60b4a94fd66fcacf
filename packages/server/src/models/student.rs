use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, required_text, validate_phone};
use crate::entity::student;
use crate::error::AppError;
use crate::utils::credentials::{parse_date_of_birth, validate_reg_no};

/// Request body for adding a student.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateStudentRequest {
    #[schema(example = "SGI22CS001")]
    pub reg_no: String,
    #[schema(example = "Rahul K")]
    pub name_of_student: String,
    /// `YYYY-MM-DD`.
    #[schema(example = "2005-04-12")]
    pub date_of_birth: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Required when an HOD adds the student; a coordinator always adds to their own class.
    pub coordinator_id: Option<Uuid>,
}

/// Validated AddStudent input.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub reg_no: String,
    pub name_of_student: String,
    pub date_of_birth: NaiveDate,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CreateStudentRequest {
    pub fn validate(&self) -> Result<NewStudent, AppError> {
        let date_of_birth = parse_date_of_birth(&self.date_of_birth)?;
        Ok(NewStudent {
            reg_no: validate_reg_no(&self.reg_no)?.to_uppercase(),
            name_of_student: required_text(&self.name_of_student, "Student name", 128)?,
            date_of_birth,
            phone: non_blank(self.phone.as_deref())
                .map(validate_phone)
                .transpose()?,
            address: non_blank(self.address.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    pub id: Uuid,
    pub reg_no: String,
    pub name_of_student: String,
    pub email: String,
    pub class_id: i32,
    pub department: String,
    pub date_of_birth: NaiveDate,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub batch_coordinator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<student::Model> for StudentResponse {
    fn from(m: student::Model) -> Self {
        Self {
            id: m.id,
            reg_no: m.reg_no,
            name_of_student: m.name_of_student,
            email: m.email,
            class_id: m.class_id,
            department: m.department,
            date_of_birth: m.date_of_birth,
            phone: m.phone,
            address: m.address,
            batch_coordinator_id: m.batch_coordinator_id,
            created_at: m.created_at,
        }
    }
}

/// Result of AddStudent: the derived login, shown once.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateStudentResponse {
    pub student: StudentResponse,
    #[schema(example = "sgi22cs001@sngist.org")]
    pub email: String,
    #[schema(example = "12042005")]
    pub initial_password: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct StudentListQuery {
    pub class_id: Option<i32>,
    pub coordinator_id: Option<Uuid>,
}

/// PATCH body. Registration number and date of birth derive the login and stay fixed.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStudentRequest {
    pub name_of_student: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

/// Fields a student may edit on their own profile.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

#[derive(Debug, Default)]
pub struct StudentPatch {
    pub name_of_student: Option<String>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

fn validate_contact(
    phone: &Option<Option<String>>,
    address: &Option<Option<String>>,
) -> Result<(Option<Option<String>>, Option<Option<String>>), AppError> {
    let phone = match phone {
        None => None,
        Some(v) => Some(non_blank(v.as_deref()).map(validate_phone).transpose()?),
    };
    let address = address
        .as_ref()
        .map(|v| non_blank(v.as_deref()).map(str::to_string));
    Ok((phone, address))
}

impl UpdateStudentRequest {
    pub fn validate(&self) -> Result<StudentPatch, AppError> {
        let (phone, address) = validate_contact(&self.phone, &self.address)?;
        Ok(StudentPatch {
            name_of_student: self
                .name_of_student
                .as_deref()
                .map(|v| required_text(v, "Student name", 128))
                .transpose()?,
            phone,
            address,
        })
    }
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<StudentPatch, AppError> {
        let (phone, address) = validate_contact(&self.phone, &self.address)?;
        Ok(StudentPatch {
            name_of_student: None,
            phone,
            address,
        })
    }
}
