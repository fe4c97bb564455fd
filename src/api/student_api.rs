// ==========================================
// 学员档案系统 - 学员 API
// ==========================================
// 职责: 学员 CRUD 与分页查询
// 红线: 标识符在本层解析，业务校验全部委托 StudentService
// ==========================================

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::student::{CreateStudentRequest, Student, StudentFilters, UpdateStudentRequest};
use crate::service::student_service::StudentService;

/// 学员列表响应（带分页信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentListResponse {
    /// 当前页学员
    pub students: Vec<Student>,
    /// 满足过滤条件的总数
    pub total: i64,
    /// 请求的每页记录数（0 表示使用默认值）
    pub limit: i64,
    /// 分页偏移
    pub offset: i64,
}

// ==========================================
// StudentApi - 学员 API
// ==========================================
pub struct StudentApi {
    service: Arc<dyn StudentService>,
}

impl StudentApi {
    /// 创建新的StudentApi实例
    pub fn new(service: Arc<dyn StudentService>) -> Self {
        Self { service }
    }

    fn parse_student_id(id: &str) -> ApiResult<Uuid> {
        Uuid::parse_str(id.trim())
            .map_err(|_| ApiError::InvalidInput(format!("invalid student id: {}", id)))
    }

    /// 创建学员
    pub async fn create_student(
        &self,
        req: CreateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ApiResult<Student> {
        let student = self.service.create_student(req, acting_user).await?;
        info!(student_id = %student.id, "学员已创建");
        Ok(student)
    }

    /// 查询学员详情（已软删除视为不存在）
    pub async fn get_student(&self, id: &str) -> ApiResult<Student> {
        let id = Self::parse_student_id(id)?;
        Ok(self.service.get_student(id).await?)
    }

    /// 分页查询学员
    ///
    /// # 参数
    /// - filters: status / cohort / residence_country_id / search + limit / offset
    ///
    /// # 返回
    /// - Ok(StudentListResponse): 当前页与总数
    pub async fn list_students(&self, filters: StudentFilters) -> ApiResult<StudentListResponse> {
        let (limit, offset) = (filters.limit, filters.offset.max(0));
        let (students, total) = self.service.list_students(filters).await?;
        debug!(returned = students.len(), total, "学员列表查询完成");
        Ok(StudentListResponse {
            students,
            total,
            limit,
            offset,
        })
    }

    /// 部分更新学员
    pub async fn update_student(
        &self,
        id: &str,
        req: UpdateStudentRequest,
        acting_user: Option<Uuid>,
    ) -> ApiResult<Student> {
        let id = Self::parse_student_id(id)?;
        let student = self.service.update_student(id, req, acting_user).await?;
        info!(student_id = %student.id, "学员已更新");
        Ok(student)
    }

    /// 软删除学员
    pub async fn delete_student(&self, id: &str, acting_user: Option<Uuid>) -> ApiResult<()> {
        let id = Self::parse_student_id(id)?;
        self.service.delete_student(id, acting_user).await?;
        info!(student_id = %id, "学员已删除");
        Ok(())
    }
}
