/// Closed set of account kinds. The wire/database code is the `i16` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Student = 1,
    Client = 2,
    Superuser = 3,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [
        AccountType::Student,
        AccountType::Client,
        AccountType::Superuser,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| i64::from(t.code()) == code)
    }
}
