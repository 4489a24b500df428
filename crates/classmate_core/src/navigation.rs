//! crates/classmate_core/src/navigation.rs
//!
//! Per-request session context and page navigation.

use serde::Serialize;
use std::str::FromStr;

use crate::domain::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Auth,
    UploadLecture,
    ViewLectures,
    AiChat,
}

impl Page {
    fn requires_login(&self) -> bool {
        !matches!(self, Page::Home | Page::Auth)
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Page::Home),
            "auth" | "login" => Ok(Page::Auth),
            "upload_lecture" | "upload" => Ok(Page::UploadLecture),
            "view_lectures" | "view" => Ok(Page::ViewLectures),
            "ai_chat" | "chat" => Ok(Page::AiChat),
            other => Err(format!("Unknown page '{}'", other)),
        }
    }
}

/// Menu entries for a role. Staff see the upload page first.
pub fn menu_for(role: Role) -> Vec<Page> {
    let mut items = vec![Page::ViewLectures, Page::AiChat];
    if role.can_upload() {
        items.insert(0, Page::UploadLecture);
    }
    items
}

/// Built once per request and handed to the handler; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub logged_in: bool,
    pub user: Option<String>,
    pub role: Option<Role>,
    pub current_page: Page,
}

impl SessionContext {
    /// Logged-out visitors can only see the home and login pages.
    pub fn anonymous(requested: Option<Page>) -> Self {
        let current_page = match requested {
            Some(page) if page.requires_login() => Page::Auth,
            Some(page) => page,
            None => Page::Home,
        };
        Self {
            logged_in: false,
            user: None,
            role: None,
            current_page,
        }
    }

    pub fn logged_in(user: &str, role: Role, requested: Option<Page>) -> Self {
        let menu = menu_for(role);
        let current_page = match requested {
            Some(page) if menu.contains(&page) => page,
            Some(Page::UploadLecture) => Page::ViewLectures,
            _ => menu[0],
        };
        Self {
            logged_in: true,
            user: Some(user.to_string()),
            role: Some(role),
            current_page,
        }
    }

    pub fn menu(&self) -> Vec<Page> {
        self.role.map(menu_for).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_menu_starts_with_upload() {
        assert_eq!(
            menu_for(Role::Staff),
            vec![Page::UploadLecture, Page::ViewLectures, Page::AiChat]
        );
        assert_eq!(menu_for(Role::Student), vec![Page::ViewLectures, Page::AiChat]);
    }

    #[test]
    fn anonymous_visitors_are_sent_to_login() {
        assert_eq!(SessionContext::anonymous(None).current_page, Page::Home);
        assert_eq!(SessionContext::anonymous(Some(Page::Auth)).current_page, Page::Auth);
        assert_eq!(SessionContext::anonymous(Some(Page::AiChat)).current_page, Page::Auth);
        assert!(SessionContext::anonymous(None).menu().is_empty());
    }

    #[test]
    fn logged_in_users_land_on_their_first_menu_item() {
        let staff = SessionContext::logged_in("prof", Role::Staff, Some(Page::Home));
        assert_eq!(staff.current_page, Page::UploadLecture);

        let student = SessionContext::logged_in("sam", Role::Student, None);
        assert_eq!(student.current_page, Page::ViewLectures);
        assert_eq!(student.user.as_deref(), Some("sam"));
    }

    #[test]
    fn students_cannot_reach_the_upload_page() {
        let student = SessionContext::logged_in("sam", Role::Student, Some(Page::UploadLecture));
        assert_eq!(student.current_page, Page::ViewLectures);

        let chat = SessionContext::logged_in("sam", Role::Student, Some(Page::AiChat));
        assert_eq!(chat.current_page, Page::AiChat);
    }

    #[test]
    fn pages_parse_from_query_values() {
        assert_eq!("home".parse(), Ok(Page::Home));
        assert_eq!("chat".parse(), Ok(Page::AiChat));
        assert!("settings".parse::<Page>().is_err());
    }
}
