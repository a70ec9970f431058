//! SOAP response fixtures mirroring the UKG login, BI data and BI streaming services

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const ENVELOPE_OPEN: &str = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing">"#;
const STREAM_NS: &str = "http://www.ultipro.com/dataservices/bistream/2";

/// Successful `Authenticate` response carrying `token`
pub fn token_response(token: &str) -> String {
    format!(
        r#"{ENVELOPE_OPEN}<s:Header/><s:Body><TokenResponse xmlns="http://www.ultipro.com/contracts"><ServiceId/><Status>Ok</Status><StatusMessage i:nil="true" xmlns:i="http://www.w3.org/2001/XMLSchema-instance"/><Token>{token}</Token></TokenResponse></s:Body></s:Envelope>"#
    )
}

/// Successful `LogOnWithToken` response
pub fn logon_response() -> String {
    format!(
        r#"{ENVELOPE_OPEN}<s:Header/><s:Body><LogOnWithTokenResponse xmlns="http://www.ultipro.com/dataservices/bidata/2"><LogOnWithTokenResult xmlns:i="http://www.w3.org/2001/XMLSchema-instance"><ClientAccessKey>CAK</ClientAccessKey><InstanceKey>instance</InstanceKey><ServiceId>service</ServiceId><SessionId>session</SessionId><Status>LoggedOn</Status><StatusMessage i:nil="true"/><Token>tok</Token><UserId>user</UserId></LogOnWithTokenResult></LogOnWithTokenResponse></s:Body></s:Envelope>"#
    )
}

/// Successful `ExecuteReport` response carrying `report_key`
pub fn execute_response(report_key: &str) -> String {
    format!(
        r#"{ENVELOPE_OPEN}<s:Header/><s:Body><ExecuteReportResponse xmlns="http://www.ultipro.com/dataservices/bidata/2"><ExecuteReportResult xmlns:i="http://www.w3.org/2001/XMLSchema-instance"><ReportKey>{report_key}</ReportKey><ReportRetrievalUri i:nil="true"/><Status>Success</Status><StatusMessage i:nil="true"/></ExecuteReportResult></ExecuteReportResponse></s:Body></s:Envelope>"#
    )
}

/// `RetrieveReport` response with `status` and an optional report stream
pub fn retrieve_response(status: &str, stream: Option<&str>) -> String {
    let encoded = stream.map(|s| STANDARD.encode(s)).unwrap_or_default();
    format!(
        r#"{ENVELOPE_OPEN}<s:Header><h:Status xmlns:h="{STREAM_NS}">{status}</h:Status><h:StatusMessage xmlns:h="{STREAM_NS}"/></s:Header><s:Body><StreamReportResponse xmlns="{STREAM_NS}"><ReportStream>{encoded}</ReportStream></StreamReportResponse></s:Body></s:Envelope>"#
    )
}

/// SOAP 1.2 fault with `reason`
pub fn fault_response(reason: &str) -> String {
    format!(
        r#"{ENVELOPE_OPEN}<s:Body><s:Fault><s:Code><s:Value>s:Receiver</s:Value></s:Code><s:Reason><s:Text xml:lang="en-US">{reason}</s:Text></s:Reason></s:Fault></s:Body></s:Envelope>"#
    )
}

/// Report stream used by most tests
pub const EMPLOYEE_REPORT: &str =
    "EmployeeNumber|LastName|FirstName\r\n000123|Lovelace|Ada\r\n000124|Hopper|Grace";
