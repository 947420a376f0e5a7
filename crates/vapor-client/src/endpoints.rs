//! Remote surface of the community service: endpoint paths and the
//! fixed header/cookie values the mobile app presents.

/// Production base URL; tests override it per client.
pub const COMMUNITY_BASE_URL: &str = "https://steamcommunity.com";

pub(crate) const MOBILECONF_LIST_PATH: &str = "/mobileconf/conf";
pub(crate) const MOBILECONF_OP_PATH: &str = "/mobileconf/ajaxop";
pub(crate) const MOBILECONF_DETAILS_PATH: &str = "/mobileconf/details";
pub(crate) const RSA_CHALLENGE_PATH: &str = "/login/getrsakey/";
pub(crate) const DO_LOGIN_PATH: &str = "/login/dologin/";

/// `X-Requested-With` value the mobile app sends on GETs.
pub(crate) const MOBILE_APP_REQUESTER: &str = "com.valvesoftware.android.steam.community";
/// `X-Requested-With` value for the confirmation act POST.
pub(crate) const AJAX_REQUESTER: &str = "XMLHttpRequest";

pub(crate) const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";
pub(crate) const DEFAULT_PLATFORM: &str = "android";

/// Referer the mobile login page would have set.
pub(crate) const MOBILE_LOGIN_REFERER: &str = "https://steamcommunity.com/mobilelogin\
    ?oauth_client_id=DEADBEEF\
    &oauth_scope=read_profile%20write_profile%20read_client%20write_client";

/// Cookies identifying the client as the mobile app during login.
pub(crate) const MOBILE_LOGIN_COOKIES: &str =
    "mobileClientVersion=0 (2.3.13); mobileClient=android; Steam_Language=schinese";
