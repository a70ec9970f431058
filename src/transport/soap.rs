//! SOAP 1.2 transport for the UKG login, BI data and BI streaming services

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::{Duration, Instant};
use url::Url;

use super::ReportTransport;
use super::xml::{all_inner_xml, element_text, escape, fault_reason, inner_xml};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::types::{
    DataContext, ReportKey, ReportParameter, ReportStatus, ReportSummary, RetrieveResponse,
};

const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const ADDRESSING_NS: &str = "http://www.w3.org/2005/08/addressing";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

const LOGIN_ENDPOINT: &str = "LoginService";
const LOGIN_NS: &str = "http://www.ultipro.com/services/loginservice";
const CONTRACTS_NS: &str = "http://www.ultipro.com/contracts";

const BI_DATA_ENDPOINT: &str = "BiDataService";
const BI_DATA_NS: &str = "http://www.ultipro.com/dataservices/bidata/2";

const BI_STREAM_ENDPOINT: &str = "BiStreamingService";
const BI_STREAM_NS: &str = "http://www.ultipro.com/dataservices/bistream/2";

/// HTTP header that tells the BI service how to delimit report fields
pub const DELIMITER_HEADER: &str = "US-DELIMITER";

/// [`ReportTransport`] over HTTPS using SOAP 1.2 envelopes
#[derive(Clone, Debug)]
pub struct SoapTransport {
    client: reqwest::Client,
    root: Url,
}

/// One outgoing SOAP call
struct SoapCall<'a> {
    endpoint: &'a str,
    operation: &'a str,
    action: String,
    headers: String,
    body: String,
    delimiter: Option<char>,
}

impl SoapTransport {
    /// Build a transport for the service root in `credentials`
    pub fn new(credentials: &Credentials, request_timeout: Duration) -> Result<Self> {
        let root = credentials.service_root()?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, root })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.root
            .join(endpoint)
            .map_err(|e| Error::config("base_url", format!("cannot join {endpoint}: {e}")))
    }

    async fn call(&self, call: SoapCall<'_>) -> Result<String> {
        let url = self.endpoint_url(call.endpoint)?;
        let envelope = format!(
            concat!(
                r#"<s:Envelope xmlns:s="{env}" xmlns:a="{addr}">"#,
                r#"<s:Header><a:Action s:mustUnderstand="1">{action}</a:Action>"#,
                r#"<a:To s:mustUnderstand="1">{to}</a:To>{headers}</s:Header>"#,
                r#"<s:Body>{body}</s:Body></s:Envelope>"#
            ),
            env = SOAP_ENV_NS,
            addr = ADDRESSING_NS,
            action = call.action,
            to = escape(url.as_str()),
            headers = call.headers,
            body = call.body,
        );

        let mut request = self
            .client
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!(
                    "application/soap+xml; charset=utf-8; action=\"{}\"",
                    call.action
                ),
            )
            .body(envelope);
        if let Some(delimiter) = call.delimiter {
            request = request.header(DELIMITER_HEADER, delimiter.to_string());
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            phase = "transport",
            operation = call.operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SOAP call returned"
        );

        if let Some(message) = fault_reason(&text) {
            return Err(Error::Fault {
                operation: call.operation.to_string(),
                message,
            });
        }
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "{} returned HTTP {status}",
                call.operation
            )));
        }
        Ok(text)
    }
}

fn bi_data_action(operation: &str) -> String {
    format!("{BI_DATA_NS}/IBIDataService/{operation}")
}

/// Data members must appear in schema order (alphabetical) or the service
/// skips the out-of-order ones.
fn context_xml(context: &DataContext) -> String {
    let field = |name: &str, value: &str| {
        if value.is_empty() {
            format!(r#"<{name} i:nil="true"/>"#)
        } else {
            format!("<{name}>{}</{name}>", escape(value))
        }
    };

    format!(
        r#"<context xmlns:i="{XSI_NS}">{}{}{}{}{}{}{}{}</context>"#,
        field("ClientAccessKey", &context.client_access_key),
        field("InstanceKey", &context.instance_key),
        field("ServiceId", &context.service_id),
        field("SessionId", &context.session_id),
        field("Status", &context.status),
        field("StatusMessage", &context.status_message),
        field("Token", &context.token),
        field("UserId", &context.user_id),
    )
}

fn parse_context(xml: &str) -> Result<DataContext> {
    let result = inner_xml(xml, "LogOnWithTokenResult").ok_or_else(|| {
        Error::Transport("LogOnWithToken response has no LogOnWithTokenResult".to_string())
    })?;
    let text = |name: &str| element_text(result, name).unwrap_or_default();

    Ok(DataContext {
        service_id: text("ServiceId"),
        client_access_key: text("ClientAccessKey"),
        token: text("Token"),
        status: text("Status"),
        status_message: text("StatusMessage"),
        instance_key: text("InstanceKey"),
        session_id: text("SessionId"),
        user_id: text("UserId"),
    })
}

fn parse_bool(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[async_trait]
impl ReportTransport for SoapTransport {
    async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        let header = |name: &str, value: &str| {
            format!(r#"<h:{name} xmlns:h="{LOGIN_NS}">{}</h:{name}>"#, escape(value))
        };
        let headers = [
            header("ClientAccessKey", &credentials.client_access_key),
            header("Password", &credentials.password),
            header("UserAccessKey", &credentials.user_access_key),
            header("UserName", &credentials.username),
        ]
        .concat();

        let response = self
            .call(SoapCall {
                endpoint: LOGIN_ENDPOINT,
                operation: "Authenticate",
                action: format!("{LOGIN_NS}/ILoginService/Authenticate"),
                headers,
                body: format!(r#"<TokenRequest xmlns="{CONTRACTS_NS}"/>"#),
                delimiter: None,
            })
            .await?;

        if let Some(status) = element_text(&response, "Status")
            && !status.eq_ignore_ascii_case("Ok")
        {
            let message = element_text(&response, "StatusMessage").unwrap_or_default();
            return Err(Error::Authentication(format!(
                "login service returned status {status}: {message}"
            )));
        }

        Ok(element_text(&response, "Token").unwrap_or_default())
    }

    async fn log_on_with_token(
        &self,
        token: &str,
        client_access_key: &str,
    ) -> Result<DataContext> {
        let body = format!(
            concat!(
                r#"<LogOnWithToken xmlns="{ns}"><logOnRequest xmlns:i="{xsi}">"#,
                "<ClientAccessKey>{key}</ClientAccessKey><Token>{token}</Token>",
                "</logOnRequest></LogOnWithToken>"
            ),
            ns = BI_DATA_NS,
            xsi = XSI_NS,
            key = escape(client_access_key),
            token = escape(token),
        );

        let response = self
            .call(SoapCall {
                endpoint: BI_DATA_ENDPOINT,
                operation: "LogOnWithToken",
                action: bi_data_action("LogOnWithToken"),
                headers: String::new(),
                body,
                delimiter: None,
            })
            .await?;

        parse_context(&response)
    }

    async fn execute_report(
        &self,
        context: &DataContext,
        report_path: &str,
        delimiter: char,
    ) -> Result<ReportKey> {
        let body = format!(
            concat!(
                r#"<ExecuteReport xmlns="{ns}"><request xmlns:i="{xsi}">"#,
                "<ReportParameters/><ReportPath>{path}</ReportPath></request>",
                "{context}</ExecuteReport>"
            ),
            ns = BI_DATA_NS,
            xsi = XSI_NS,
            path = escape(report_path),
            context = context_xml(context),
        );

        let response = self
            .call(SoapCall {
                endpoint: BI_DATA_ENDPOINT,
                operation: "ExecuteReport",
                action: bi_data_action("ExecuteReport"),
                headers: String::new(),
                body,
                delimiter: Some(delimiter),
            })
            .await?;

        let result = inner_xml(&response, "ExecuteReportResult").unwrap_or(response.as_str());
        if let Some(status) = element_text(result, "Status")
            && status.eq_ignore_ascii_case("Failed")
        {
            let message = element_text(result, "StatusMessage").unwrap_or_default();
            return Err(Error::Submission(format!(
                "ExecuteReport returned status Failed: {message}"
            )));
        }

        Ok(ReportKey::new(
            element_text(result, "ReportKey").unwrap_or_default(),
        ))
    }

    async fn retrieve_report(&self, report_key: &ReportKey) -> Result<RetrieveResponse> {
        let headers = format!(
            r#"<h:ReportKey xmlns:h="{BI_STREAM_NS}" xmlns="{BI_STREAM_NS}">{}</h:ReportKey>"#,
            escape(report_key.as_str())
        );

        let response = self
            .call(SoapCall {
                endpoint: BI_STREAM_ENDPOINT,
                operation: "RetrieveReport",
                action: format!("{BI_STREAM_NS}/IBIStreamService/RetrieveReport"),
                headers,
                body: format!(r#"<RetrieveReportRequest xmlns="{BI_STREAM_NS}"/>"#),
                delimiter: None,
            })
            .await?;

        let header = inner_xml(&response, "Header").unwrap_or_default();
        let status = element_text(header, "Status")
            .ok_or_else(|| Error::Transport("RetrieveReport response has no Status".to_string()))?
            .parse::<ReportStatus>()?;

        let body = inner_xml(&response, "Body").unwrap_or_default();
        let stream = match element_text(body, "ReportStream") {
            Some(encoded) if !encoded.is_empty() => {
                let compact: String = encoded.split_whitespace().collect();
                let bytes = STANDARD
                    .decode(compact)
                    .map_err(|e| Error::Decode(format!("report stream is not base64: {e}")))?;
                Some(bytes)
            }
            _ => None,
        };

        Ok(RetrieveResponse { status, stream })
    }

    async fn get_report_list(&self, context: &DataContext) -> Result<Vec<ReportSummary>> {
        let body = format!(
            r#"<GetReportList xmlns="{BI_DATA_NS}">{}</GetReportList>"#,
            context_xml(context)
        );

        let response = self
            .call(SoapCall {
                endpoint: BI_DATA_ENDPOINT,
                operation: "GetReportList",
                action: bi_data_action("GetReportList"),
                headers: String::new(),
                body,
                delimiter: None,
            })
            .await?;

        Ok(all_inner_xml(&response, "Report")
            .into_iter()
            .map(|report| ReportSummary {
                name: element_text(report, "ReportName").unwrap_or_default(),
                path: element_text(report, "ReportPath").unwrap_or_default(),
            })
            .filter(|report| !report.path.is_empty())
            .collect())
    }

    async fn get_report_parameters(
        &self,
        report_path: &str,
        context: &DataContext,
    ) -> Result<Vec<ReportParameter>> {
        let body = format!(
            r#"<GetReportParameters xmlns="{BI_DATA_NS}"><reportPath>{}</reportPath>{}</GetReportParameters>"#,
            escape(report_path),
            context_xml(context)
        );

        let response = self
            .call(SoapCall {
                endpoint: BI_DATA_ENDPOINT,
                operation: "GetReportParameters",
                action: bi_data_action("GetReportParameters"),
                headers: String::new(),
                body,
                delimiter: None,
            })
            .await?;

        Ok(all_inner_xml(&response, "ReportParameter")
            .into_iter()
            .map(|param| ReportParameter {
                name: element_text(param, "Name").unwrap_or_default(),
                data_type: element_text(param, "DataType").unwrap_or_default(),
                required: parse_bool(element_text(param, "Required")),
                multi_valued: parse_bool(element_text(param, "MultiValued")),
                default_value: element_text(param, "DefaultValue").filter(|v| !v.is_empty()),
            })
            .collect())
    }
}
