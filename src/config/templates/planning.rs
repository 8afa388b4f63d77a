/// Default planning document layout. Rendered to HTML so Drive can convert
/// the upload into a Google Doc.
pub const STANDARD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
</head>
<body>
<h1>{{ title }}</h1>
<h2>Summary</h2>
{% if table|length > 0 %}
<table border="1">
{% for label in table %}
<tr><td>{{ label }}</td><td></td></tr>
{% endfor %}
</table>
{% endif %}
{% for lesson in lessons %}
<h2>{{ lesson.heading }}</h2>
{% endfor %}
</body>
</html>
"#;
