#![allow(dead_code)]

use form_autofill::form::form_model::{FormFieldDescriptor, ProjectDataBag};

pub fn descriptor(selector: &str, element_type: &str) -> FormFieldDescriptor {
    FormFieldDescriptor {
        selector: selector.into(),
        element_type: element_type.into(),
        name: String::new(),
        id: String::new(),
        placeholder: String::new(),
        associated_label_text: String::new(),
        required: false,
        disabled: false,
        readonly: false,
        current_value: String::new(),
    }
}

pub fn named(selector: &str, element_type: &str, name: &str) -> FormFieldDescriptor {
    FormFieldDescriptor {
        name: name.into(),
        ..descriptor(selector, element_type)
    }
}

pub fn project(pairs: &[(&str, &str)]) -> ProjectDataBag {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn sample_project() -> ProjectDataBag {
    project(&[
        ("businessName", "Acme Widgets"),
        ("email", "a@b.com"),
        ("phone", "+1 555 0100"),
        ("website", "https://acme.example"),
        ("city", "Springfield"),
        ("country", "US"),
        ("metaDescription", "Widgets for every occasion"),
    ])
}

pub const SIGNUP_FORM: &str = r#"<!DOCTYPE html>
<html>
<body>
<form id="signup">
  <label for="company">Company name</label>
  <input id="company" type="text">
  <input type="email" name="contact_email" placeholder="you@example.com">
  <label>Mobile <input type="text" name="biz_phone_number"></label>
  <input type="text" name="city" value="Paris">
  <input type="hidden" name="csrf" value="t0k3n">
  <input type="password" name="secret">
  <textarea name="about" aria-label="Tell us about you"></textarea>
  <select name="country">
    <option value="">Choose</option>
    <option value="US">United States</option>
    <option value="FR">France</option>
  </select>
  <input type="text" disabled name="website">
  <button type="submit">Send</button>
</form>
<form id="newsletter">
  <input type="email" id="news-email">
</form>
</body>
</html>
"#;
