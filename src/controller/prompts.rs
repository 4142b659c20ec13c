// SPDX-License-Identifier: MIT
//! Controller instructions and scripted request builders.

/// Instructions for the interactive browser assistant.
pub const BROWSER_ASSISTANT: &str = "\
You are a helpful assistant that can control web browsers using Playwright. \
When asked to navigate to websites, take screenshots, or perform login \
actions, use the available browser tools. Always be specific about the \
actions you take. For login actions, look for common login form elements like:
- Input fields with type='email', type='text', or name/placeholder containing 'email', 'username', 'user'
- Password fields with type='password'
- Submit buttons with text like 'Login', 'Sign In', 'Submit', or type='submit'
- Look for forms and fill them appropriately.
When taking screenshots, save them with descriptive names.";

/// Instructions for the scripted login workflow.
pub const LOGIN_SPECIALIST: &str = "\
You are a specialized assistant for web login automation using Playwright.

When performing login actions, follow these steps:
1. Navigate to the login page
2. Take a screenshot of the login page
3. Look for login form elements:
   - Email/username input fields (type='email', type='text', name/placeholder containing 'email', 'username', 'user')
   - Password input fields (type='password')
   - Submit buttons (text like 'Login', 'Sign In', 'Submit', or type='submit')
4. Fill in the login form with the provided credentials
5. Take a screenshot after filling the form
6. Submit the form
7. Take a screenshot after login attempt
8. Check if login was successful by looking for success indicators or error messages

Always save screenshots with descriptive names like:
- 'login_page.png'
- 'login_form_filled.png'
- 'login_result.png'
- 'dashboard_after_login.png'

Be thorough and report any errors or issues encountered during the login process.";

/// Build the single scripted request for a login run.  Credentials are
/// optional; without them the run only surveys the login page.
pub fn build_login_request(url: &str, username: Option<&str>, password: Option<&str>) -> String {
    let mut request = format!("Navigate to {url} and take a screenshot of the login page");
    match (username, password) {
        (Some(user), Some(pass)) => {
            request.push_str(&format!(
                ". Then perform a login with username '{user}' and password '{pass}'. \
                 Take screenshots at each step: before filling the form, after filling \
                 the form, and after submitting. Check if the login was successful."
            ));
        }
        _ => {
            request.push_str(
                ". Look for login form elements and take screenshots of the login page.",
            );
        }
    }
    request
}
