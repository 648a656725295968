use crate::api::attendance::{
    BulkMarkRequest, HistoryQuery, HistoryResponse, HistoryRow,
};
use crate::api::company;
use crate::api::declaration::DeclarationResponse;
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::masters::{NamePayload, SubDepartmentPayload};
use crate::domain::declaration::{
    DeclarationSubmission, HouseProperty, HouseRent, Section80c, SectionUpdate, SectionViA,
    TaxRegime,
};
use crate::domain::grid::CellEdit;
use crate::domain::status::AttendanceStatus;
use crate::domain::workflow::MonthState;
use crate::model::company::Company;
use crate::model::employee::Employee;
use crate::model::master::{MasterRecord, SubDepartment};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Backend API",
        version = "1.0.0",
        description = r#"
## HR Management Backend

REST backend for employee records, month-partitioned attendance with a
lock workflow, organizational master data and investment declarations.

### Key Features
- **Employee Management**
  - Create, update, list, import and export employee profiles
- **Attendance**
  - Month grid with edit / save / lock / unlock workflow, derived pay days,
    CSV import/export once locked
- **Master Data**
  - Branches, departments, sub-departments, designations, grades,
    categories and separation reasons with duplicate-name guards
- **Investment Declarations**
  - Old/new regime tax declarations with per-field statutory caps

### Security
Endpoints are protected using **JWT Bearer authentication**.
Month unlock is restricted to **Admin**; HR handles day-to-day entry.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::history,
        crate::api::attendance::begin_edit,
        crate::api::attendance::bulk_mark,
        crate::api::attendance::lock_month,
        crate::api::attendance::unlock_month,
        crate::api::attendance::import_month,
        crate::api::attendance::export_month,
        crate::api::attendance::template,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::import_employees,
        crate::api::employee::export_employees,

        crate::api::declaration::get_declaration,
        crate::api::declaration::put_declaration,

        company::get_company,
        company::test_domain
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            HistoryQuery,
            HistoryRow,
            HistoryResponse,
            BulkMarkRequest,
            CellEdit,
            AttendanceStatus,
            MonthState,
            DeclarationSubmission,
            DeclarationResponse,
            SectionUpdate,
            HouseRent,
            Section80c,
            SectionViA,
            HouseProperty,
            TaxRegime,
            Company,
            MasterRecord,
            SubDepartment,
            NamePayload,
            SubDepartmentPayload
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance grid and month workflow APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Declaration", description = "Investment declaration APIs"),
        (name = "Company", description = "Tenant resolution APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
