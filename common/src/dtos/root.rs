use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootDto {
    pub version: &'static str,
    pub name: &'static str,
    #[serde(rename = "_links")]
    pub _links: RootLinks,
}

#[derive(Debug, Serialize)]
pub struct RootLinks {
    pub generate: &'static str,
    pub convert_html_to_pdf: &'static str,
    pub health: &'static str,
    pub metrics: &'static str,
    pub tools: &'static str,
}
