use crate::data_formats::{FieldErrors, LoginForm, SignupForm};

use super::{escape, field_error, layout, Layout};

pub fn login_page(form: &LoginForm, errors: &FieldErrors) -> String {
    let main = format!(
        r#"<h1>Log In</h1>
{error}
<form id="login-form" method="post" action="/accounts/login/">
<label for="id_username">Username</label>
<input type="text" id="id_username" name="username" value="{username}">
<label for="id_password">Password</label>
<input type="password" id="id_password" name="password">
<button type="submit">Log In</button>
</form>
<p>No account yet? <a href="/accounts/signup/">Sign up</a></p>"#,
        error = field_error(errors, "__all__"),
        username = escape(&form.username),
    );
    layout(Layout::new("Log In", None), &main)
}

pub fn signup_page(form: &SignupForm, errors: &FieldErrors) -> String {
    let main = format!(
        r#"<h1>Sign Up</h1>
<form id="signup-form" method="post" action="/accounts/signup/">
<label for="id_username">Username</label>
<input type="text" id="id_username" name="username" value="{username}">
{username_error}
<label for="id_password1">Password</label>
<input type="password" id="id_password1" name="password1">
{password1_error}
<label for="id_password2">Password confirmation</label>
<input type="password" id="id_password2" name="password2">
{password2_error}
<button type="submit">Sign Up</button>
</form>"#,
        username = escape(&form.username),
        username_error = field_error(errors, "username"),
        password1_error = field_error(errors, "password1"),
        password2_error = field_error(errors, "password2"),
    );
    layout(Layout::new("Sign Up", None), &main)
}
